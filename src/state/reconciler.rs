//! Layout reconciler: the one entry point that loads, mutates and persists
//! the launcher layout.
//!
//! Mutations run on a copy of the current pages and replace them only on
//! success, so a failed operation leaves the previous layout in effect.
//! Callers serialize mutations (`&mut self`) and persist at gesture end.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog::AppCatalog;
use super::config::LayoutConfig;
use super::data::{Folder, GridItem, SlotRef};
use super::layout::{Layout, SplitOutcome};
use super::legacy::LegacyStore;
use super::library::Library;
use super::pages::{self, PageStore, Stamp};
use crate::error::{LayoutError, Result};
use crate::icon::{FolderIconCache, IconResolver, RenderContext};

/// Owns the layout database, the current pages and the render context
pub struct Reconciler {
    library: Library,
    config: LayoutConfig,
    catalog: AppCatalog,
    render: RenderContext,
    layout: Layout,
}

impl Reconciler {
    /// Build a reconciler over an open library. Nothing is loaded yet; the
    /// layout starts as one empty page until `load` runs.
    pub fn new(
        library: Library,
        config: LayoutConfig,
        catalog: AppCatalog,
        resolver: Arc<dyn IconResolver>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(FolderIconCache::with_capacity(config.icon_cache_capacity)?);
        let render = RenderContext::new(cache, resolver, config.folder_icon_side);
        let layout = Layout::empty(config.page_capacity);

        Ok(Self {
            library,
            config,
            catalog,
            render,
            layout,
        })
    }

    /// Open the library and config in a data directory
    pub fn open(
        data_dir: &Path,
        catalog: AppCatalog,
        resolver: Arc<dyn IconResolver>,
    ) -> Result<Self> {
        let config = LayoutConfig::load(data_dir)?;
        let library = Library::open_in(data_dir)?;
        Self::new(library, config, catalog, resolver)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub(crate) fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.render
    }

    /// Swap in a fresh discovery result; takes effect on the next `load`
    pub fn set_catalog(&mut self, catalog: AppCatalog) {
        self.catalog = catalog;
    }

    /// Load pages from the store.
    ///
    /// Page-slot records win; failing that, legacy records are migrated and
    /// persisted first; failing that, one empty page is returned. Gaps and
    /// overflow are healed and written back. Slot collisions are returned
    /// as errors and the current layout is kept.
    pub fn load(&mut self) -> Result<&Layout> {
        let layout = read_layout(&self.library, self.config.page_capacity, &self.catalog)?;
        info!(
            pages = layout.page_count(),
            items = layout.real_item_count(),
            "layout loaded"
        );
        self.layout = layout;
        Ok(&self.layout)
    }

    /// Check the stored records without loading or healing them
    pub fn validate_store(&self) -> Result<()> {
        let records = PageStore::new(self.library.conn()).load_all()?;
        pages::validate(&records, self.config.page_capacity)
    }

    /// Run a mutation on a copy of the pages and keep it only on success
    fn mutate<T>(&mut self, op: impl FnOnce(&mut Layout) -> Result<T>) -> Result<T> {
        let mut next = self.layout.clone();
        let result = op(&mut next)?;
        pages::validate(&next.to_records(), self.config.page_capacity)?;
        self.layout = next;
        Ok(result)
    }

    /// Move `item` from one slot to another with insert-and-shift semantics
    pub fn move_item(&mut self, item: &GridItem, from: SlotRef, to: SlotRef) -> Result<()> {
        let current = self
            .layout
            .get(from)
            .ok_or(LayoutError::SlotOutOfBounds(from))?;
        if current != item {
            return Err(LayoutError::ItemMismatch {
                expected: item.id(),
                found: current.id(),
            });
        }

        self.mutate(|layout| layout.move_item(from, to))?;
        debug!(%from, %to, "moved item");
        Ok(())
    }

    /// Drop the application at `dragged` onto the item at `target`
    pub fn merge_into_folder(&mut self, dragged: SlotRef, target: SlotRef) -> Result<Folder> {
        let name = self.config.default_folder_name.clone();
        let folder = self.mutate(|layout| layout.merge_into_folder(dragged, target, &name))?;
        debug!(folder = %folder.id, members = folder.apps.len(), "merged into folder");
        Ok(folder)
    }

    /// Take `app_path` out of a folder, placing it at `destination` or the
    /// first free slot
    pub fn split_from_folder(
        &mut self,
        app_path: &str,
        folder_id: &str,
        destination: Option<SlotRef>,
    ) -> Result<SplitOutcome> {
        let dissolve = self.config.dissolve_single_member_folders;
        let outcome = self.mutate(|layout| {
            layout.split_from_folder(app_path, folder_id, destination, dissolve)
        })?;
        debug!(app = app_path, placed_at = %outcome.placed_at, "split from folder");
        Ok(outcome)
    }

    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> Result<Folder> {
        self.mutate(|layout| layout.rename_folder(folder_id, name))
    }

    /// Remove trailing empty pages; returns how many were dropped
    pub fn compact(&mut self) -> usize {
        let removed = self.layout.compact();
        if removed > 0 {
            debug!(removed, "compacted trailing pages");
        }
        removed
    }

    /// Place catalog applications that appear nowhere in the layout
    pub fn sync_apps(&mut self) -> Result<usize> {
        let referenced = self.layout.referenced_paths();
        let missing: Vec<_> = self
            .catalog
            .iter()
            .filter(|app| !referenced.contains(&app.path))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }
        let placed = self.mutate(|layout| Ok(layout.place_all(missing)))?;
        info!(placed, "placed newly discovered applications");
        Ok(placed)
    }

    /// Write every slot of the current layout in one transaction.
    ///
    /// On failure nothing is written and the in-memory layout is unchanged.
    pub fn persist(&mut self) -> Result<()> {
        let records = self.layout.to_records();
        pages::validate(&records, self.config.page_capacity)?;

        PageStore::new(self.library.conn())
            .replace_all(&records, Stamp::Refresh)
            .map_err(|err| {
                warn!(error = %err, "persist failed, previous layout kept");
                err
            })?;

        debug!(slots = records.len(), "layout persisted");
        Ok(())
    }

    /// Forget the stored layout (both schemas) and start from one empty page
    pub fn reset(&mut self) -> Result<()> {
        self.library.clear()?;
        self.render.cache().clear();
        self.layout = Layout::empty(self.config.page_capacity);
        info!("layout reset");
        Ok(())
    }

    /// Adopt a layout read from a database that was just swapped in
    pub(crate) fn adopt(&mut self, layout: Layout) {
        self.render.cache().clear();
        self.layout = layout;
    }
}

/// Read, migrate and heal the layout stored in `library`.
///
/// Migration and healing are written back into `library`; nothing else is
/// touched, so this also checks a staged import before it goes live.
pub(crate) fn read_layout(
    library: &Library,
    capacity: usize,
    catalog: &AppCatalog,
) -> Result<Layout> {
    let store = PageStore::new(library.conn());
    let mut records = store.load_all()?;

    if records.is_empty() {
        let migrated = LegacyStore::new(library.conn()).migrate_to_pages(capacity)?;
        if !migrated.is_empty() {
            records = store.replace_all(&migrated, Stamp::Preserve)?;
        }
    }

    if records.is_empty() {
        debug!("no stored layout, starting with one empty page");
        return Ok(Layout::empty(capacity));
    }

    match pages::validate(&records, capacity) {
        Ok(()) => {}
        Err(LayoutError::Gap {
            page_index,
            position,
        }) => {
            warn!(page_index, position, "stored layout has a gap, healing");
        }
        Err(LayoutError::PositionOutOfRange { slot_id, capacity }) => {
            warn!(%slot_id, capacity, "stored slot beyond capacity, healing");
        }
        Err(err) => return Err(err),
    }

    let (layout, mut healed) = Layout::from_records(&records, capacity, catalog);
    let stale = store.stale_slot_count()?;
    if stale > 0 {
        warn!(stale, "rewriting rows stored under the wrong slot id");
        healed = true;
    }

    if healed {
        store.replace_all(&layout.to_records(), Stamp::Refresh)?;
        info!(pages = layout.page_count(), "healed layout persisted");
    }
    Ok(layout)
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("library", &self.library)
            .field("config", &self.config)
            .field("pages", &self.layout.page_count())
            .finish()
    }
}

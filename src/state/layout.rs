//! In-memory pages of grid items and the rules for mutating them
//!
//! Every page always holds exactly `page_capacity` items; a position with no
//! real item holds an `Empty` placeholder. All mutations here keep that true.

use std::collections::HashSet;
use tracing::warn;

use super::catalog::AppCatalog;
use super::data::{Application, Folder, GridItem, SlotPayload, SlotRecord, SlotRef};
use crate::error::{LayoutError, Result};

/// What a split left behind
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// The folder after removal; None once it was deleted or dissolved
    pub folder: Option<Folder>,
    /// Where the removed application now sits
    pub placed_at: SlotRef,
}

/// Ordered, fixed-width pages of grid items
#[derive(Debug, Clone)]
pub struct Layout {
    page_capacity: usize,
    pages: Vec<Vec<GridItem>>,
}

impl Layout {
    /// One page of placeholders
    pub fn empty(page_capacity: usize) -> Self {
        Self {
            page_capacity,
            pages: vec![empty_page(page_capacity)],
        }
    }

    /// Rebuild pages from stored records.
    ///
    /// Missing positions become `Empty`. Records past the capacity, or on a
    /// page index beyond what the record count can fill, are re-flowed onto
    /// new trailing pages in slot order. Folders without members become
    /// `Empty`. The flag reports whether anything was healed.
    pub fn from_records(
        records: &[SlotRecord],
        page_capacity: usize,
        catalog: &AppCatalog,
    ) -> (Self, bool) {
        let mut sorted: Vec<&SlotRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.slot);

        // every stored page holds at least one record
        let page_limit = records.len();
        let in_range =
            |slot: SlotRef| slot.position < page_capacity && slot.page_index < page_limit;

        let page_count = sorted
            .iter()
            .filter(|r| in_range(r.slot))
            .map(|r| r.slot.page_index + 1)
            .max()
            .unwrap_or(1);

        let mut layout = Self {
            page_capacity,
            pages: (0..page_count).map(|_| empty_page(page_capacity)).collect(),
        };
        let mut healed = false;
        let mut filled = 0usize;
        let mut overflow = Vec::new();

        for record in sorted {
            let item = match item_from_payload(record, catalog) {
                Some(item) => item,
                None => {
                    warn!(slot = %record.slot, "folder without members replaced by empty slot");
                    healed = true;
                    GridItem::empty()
                }
            };

            if in_range(record.slot) {
                layout.pages[record.slot.page_index][record.slot.position] = item;
                filled += 1;
            } else {
                overflow.push(item);
            }
        }

        let expected = page_count.saturating_mul(page_capacity);
        if filled < expected {
            warn!(
                missing = expected - filled,
                "filling missing positions with empty slots"
            );
            healed = true;
        }

        if !overflow.is_empty() {
            warn!(count = overflow.len(), "re-flowing items outside the page range");
            healed = true;
            for chunk in overflow.chunks(page_capacity) {
                let mut page = empty_page(page_capacity);
                for (position, item) in chunk.iter().enumerate() {
                    page[position] = item.clone();
                }
                layout.pages.push(page);
            }
        }

        (layout, healed)
    }

    pub fn page_capacity(&self) -> usize {
        self.page_capacity
    }

    pub fn pages(&self) -> &[Vec<GridItem>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn get(&self, slot: SlotRef) -> Option<&GridItem> {
        self.pages.get(slot.page_index)?.get(slot.position)
    }

    /// Every slot, real and empty
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// Slots holding an application or folder
    pub fn real_item_count(&self) -> usize {
        self.pages
            .iter()
            .flatten()
            .filter(|item| !item.is_empty())
            .count()
    }

    /// One record per slot, in (page, position) order
    pub fn to_records(&self) -> Vec<SlotRecord> {
        self.slots()
            .map(|(slot, item)| SlotRecord::new(slot, item.payload()))
            .collect()
    }

    /// Slot of the folder with this identifier
    pub fn find_folder(&self, folder_id: &str) -> Option<SlotRef> {
        self.slots()
            .find(|(_, item)| matches!(item, GridItem::Folder(f) if f.id == folder_id))
            .map(|(slot, _)| slot)
    }

    /// Slot of a top-level application
    pub fn find_app(&self, path: &str) -> Option<SlotRef> {
        self.slots()
            .find(|(_, item)| matches!(item, GridItem::Application(a) if a.path == path))
            .map(|(slot, _)| slot)
    }

    /// Paths placed anywhere, top level or inside folders
    pub fn referenced_paths(&self) -> HashSet<String> {
        let mut paths = HashSet::new();
        for item in self.pages.iter().flatten() {
            match item {
                GridItem::Application(app) => {
                    paths.insert(app.path.clone());
                }
                GridItem::Folder(folder) => paths.extend(folder.member_paths()),
                GridItem::Empty(_) => {}
            }
        }
        paths
    }

    fn slots(&self) -> impl Iterator<Item = (SlotRef, &GridItem)> + '_ {
        self.pages.iter().enumerate().flat_map(|(page_index, page)| {
            page.iter()
                .enumerate()
                .map(move |(position, item)| (SlotRef::new(page_index, position), item))
        })
    }

    fn check_slot(&self, slot: SlotRef) -> Result<()> {
        if slot.page_index < self.pages.len() && slot.position < self.page_capacity {
            Ok(())
        } else {
            Err(LayoutError::SlotOutOfBounds(slot))
        }
    }

    /// Allow addressing one page past the end by appending it
    fn open_page(&mut self, slot: SlotRef) -> Result<()> {
        if slot.page_index == self.pages.len() && slot.position < self.page_capacity {
            self.pages.push(empty_page(self.page_capacity));
        }
        self.check_slot(slot)
    }

    /// Relocate the item at `from` to `to` with insert-and-shift semantics.
    ///
    /// Only the source and destination pages change. A cross-page move needs
    /// an `Empty` on the destination page to absorb the shift.
    pub fn move_item(&mut self, from: SlotRef, to: SlotRef) -> Result<()> {
        self.check_slot(from)?;
        if from == to {
            return Ok(());
        }
        self.open_page(to)?;

        if from.page_index == to.page_index {
            let page = &mut self.pages[from.page_index];
            let item = page.remove(from.position);
            page.insert(to.position, item);
            return Ok(());
        }

        if !self.pages[to.page_index].iter().any(GridItem::is_empty) {
            return Err(LayoutError::PageFull(to.page_index));
        }

        let source = &mut self.pages[from.page_index];
        let item = source.remove(from.position);
        source.push(GridItem::empty());

        self.insert_shifting(to, item)
    }

    /// Insert at `slot`, shifting the page tail and dropping the nearest
    /// `Empty` after (else before) the slot to keep the page width.
    fn insert_shifting(&mut self, slot: SlotRef, item: GridItem) -> Result<()> {
        let page = &mut self.pages[slot.page_index];
        page.insert(slot.position, item);

        let absorb = (slot.position + 1..page.len())
            .find(|&i| page[i].is_empty())
            .or_else(|| (0..slot.position).rev().find(|&i| page[i].is_empty()));

        match absorb {
            Some(index) => {
                page.remove(index);
                Ok(())
            }
            None => {
                page.remove(slot.position);
                Err(LayoutError::PageFull(slot.page_index))
            }
        }
    }

    /// Drop an application onto another item.
    ///
    /// Onto an application: a new folder `[target, dragged]` takes the
    /// target's slot. Onto a folder: the application is appended. Either way
    /// the dragged slot becomes `Empty`.
    pub fn merge_into_folder(
        &mut self,
        dragged: SlotRef,
        target: SlotRef,
        folder_name: &str,
    ) -> Result<Folder> {
        self.check_slot(dragged)?;
        self.check_slot(target)?;
        if dragged == target {
            return Err(LayoutError::InvalidMerge("cannot drop an item onto itself".to_string()));
        }

        let app = match &self.pages[dragged.page_index][dragged.position] {
            GridItem::Application(app) => app.clone(),
            GridItem::Folder(_) => {
                return Err(LayoutError::InvalidMerge(
                    "folders cannot be dropped into folders".to_string(),
                ))
            }
            GridItem::Empty(_) => return Err(LayoutError::EmptySlot(dragged)),
        };

        let folder = match &mut self.pages[target.page_index][target.position] {
            GridItem::Application(existing) => {
                let folder = Folder::new(folder_name, vec![existing.clone(), app]);
                self.pages[target.page_index][target.position] = GridItem::Folder(folder.clone());
                folder
            }
            GridItem::Folder(folder) => {
                if !folder.contains(&app.path) {
                    folder.apps.push(app);
                }
                folder.clone()
            }
            GridItem::Empty(_) => return Err(LayoutError::EmptySlot(target)),
        };

        self.pages[dragged.page_index][dragged.position] = GridItem::empty();
        Ok(folder)
    }

    /// Take an application out of a folder and place it on the grid.
    ///
    /// An emptied folder becomes `Empty`. A folder left with one member turns
    /// into that application when `dissolve_single` is set. The application
    /// goes to `destination` if given, else to the first free slot starting
    /// at the folder's page, else onto a new page.
    pub fn split_from_folder(
        &mut self,
        app_path: &str,
        folder_id: &str,
        destination: Option<SlotRef>,
        dissolve_single: bool,
    ) -> Result<SplitOutcome> {
        let folder_slot = self
            .find_folder(folder_id)
            .ok_or_else(|| LayoutError::NotFound(format!("folder {}", folder_id)))?;

        let GridItem::Folder(folder) = &mut self.pages[folder_slot.page_index][folder_slot.position]
        else {
            return Err(LayoutError::NotFound(format!("folder {}", folder_id)));
        };

        let index = folder
            .apps
            .iter()
            .position(|a| a.path == app_path)
            .ok_or_else(|| LayoutError::NotFound(format!("{} in folder {}", app_path, folder_id)))?;
        let app = folder.apps.remove(index);

        let remaining = match folder.apps.len() {
            0 => {
                self.set(folder_slot, GridItem::empty());
                None
            }
            1 if dissolve_single => {
                let last = folder.apps.remove(0);
                self.set(folder_slot, GridItem::Application(last));
                None
            }
            _ => Some(folder.clone()),
        };

        let placed_at = match destination {
            Some(slot) => {
                self.open_page(slot)?;
                self.insert_shifting(slot, GridItem::Application(app))?;
                slot
            }
            None => {
                let slot = self.first_free_from(folder_slot.page_index);
                self.set(slot, GridItem::Application(app));
                slot
            }
        };

        Ok(SplitOutcome {
            folder: remaining,
            placed_at,
        })
    }

    /// Change a folder's display name; its identifier stays
    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> Result<Folder> {
        let slot = self
            .find_folder(folder_id)
            .ok_or_else(|| LayoutError::NotFound(format!("folder {}", folder_id)))?;
        match &mut self.pages[slot.page_index][slot.position] {
            GridItem::Folder(folder) => {
                folder.name = name.to_string();
                Ok(folder.clone())
            }
            _ => Err(LayoutError::NotFound(format!("folder {}", folder_id))),
        }
    }

    /// Place applications in the first free slots, appending pages as needed
    pub fn place_all(&mut self, apps: impl IntoIterator<Item = Application>) -> usize {
        let mut placed = 0;
        for app in apps {
            let slot = self.first_free_from(0);
            self.set(slot, GridItem::Application(app));
            placed += 1;
        }
        placed
    }

    /// Drop trailing all-empty pages after the last page with a real item.
    /// At least one page always remains.
    pub fn compact(&mut self) -> usize {
        let keep = self
            .pages
            .iter()
            .rposition(|page| page.iter().any(|item| !item.is_empty()))
            .map_or(1, |last| last + 1);

        let removed = self.pages.len().saturating_sub(keep);
        self.pages.truncate(keep);
        removed
    }

    fn set(&mut self, slot: SlotRef, item: GridItem) {
        self.pages[slot.page_index][slot.position] = item;
    }

    /// First `Empty` at or after `page_index`, then before it, else a new page
    fn first_free_from(&mut self, page_index: usize) -> SlotRef {
        let order = (page_index..self.pages.len()).chain(0..page_index.min(self.pages.len()));
        for page in order {
            if let Some(position) = self.pages[page].iter().position(GridItem::is_empty) {
                return SlotRef::new(page, position);
            }
        }
        self.pages.push(empty_page(self.page_capacity));
        SlotRef::new(self.pages.len() - 1, 0)
    }
}

fn empty_page(page_capacity: usize) -> Vec<GridItem> {
    (0..page_capacity).map(|_| GridItem::empty()).collect()
}

fn item_from_payload(record: &SlotRecord, catalog: &AppCatalog) -> Option<GridItem> {
    match &record.payload {
        SlotPayload::App { path } => Some(GridItem::Application(catalog.resolve(path))),
        SlotPayload::Folder { id, name, members } => {
            if members.is_empty() {
                return None;
            }
            Some(GridItem::Folder(Folder {
                id: id.clone(),
                name: name.clone(),
                apps: members.iter().map(|path| catalog.resolve(path)).collect(),
                created_at: record.created_at,
            }))
        }
        SlotPayload::Empty => Some(GridItem::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Page of `capacity` slots with apps named by `paths`, then empties
    fn layout_with(capacity: usize, pages: &[&[&str]]) -> Layout {
        let mut layout = Layout {
            page_capacity: capacity,
            pages: Vec::new(),
        };
        for paths in pages {
            let mut page = empty_page(capacity);
            for (i, path) in paths.iter().enumerate() {
                if !path.is_empty() {
                    page[i] = GridItem::Application(Application::unresolved(*path));
                }
            }
            layout.pages.push(page);
        }
        layout
    }

    fn path_at(layout: &Layout, page: usize, pos: usize) -> Option<String> {
        layout
            .get(SlotRef::new(page, pos))
            .and_then(GridItem::as_app)
            .map(|a| a.path.clone())
    }

    fn record(page: usize, pos: usize, payload: SlotPayload) -> SlotRecord {
        SlotRecord::new(SlotRef::new(page, pos), payload)
    }

    #[test]
    fn test_from_records_fills_gaps() {
        let records = vec![
            record(0, 0, SlotPayload::App { path: "/a.app".into() }),
            record(0, 2, SlotPayload::App { path: "/b.app".into() }),
        ];
        let (layout, healed) = Layout::from_records(&records, 4, &AppCatalog::new());

        assert!(healed);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.item_count(), 4);
        assert!(layout.get(SlotRef::new(0, 1)).unwrap().is_empty());
        assert_eq!(path_at(&layout, 0, 2).as_deref(), Some("/b.app"));
    }

    #[test]
    fn test_from_records_complete_is_not_healed() {
        let records = vec![
            record(0, 0, SlotPayload::App { path: "/a.app".into() }),
            record(0, 1, SlotPayload::Empty),
        ];
        let (_, healed) = Layout::from_records(&records, 2, &AppCatalog::new());
        assert!(!healed);
    }

    #[test]
    fn test_from_records_reflows_overflow() {
        let records = vec![
            record(0, 0, SlotPayload::App { path: "/a.app".into() }),
            record(0, 1, SlotPayload::Empty),
            record(0, 5, SlotPayload::App { path: "/late.app".into() }),
        ];
        let (layout, healed) = Layout::from_records(&records, 2, &AppCatalog::new());

        assert!(healed);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(path_at(&layout, 1, 0).as_deref(), Some("/late.app"));
    }

    #[test]
    fn test_from_records_reflows_runaway_page_index() {
        let records = vec![
            record(0, 0, SlotPayload::App { path: "/a.app".into() }),
            record(0, 1, SlotPayload::Empty),
            record(usize::MAX, 0, SlotPayload::App { path: "/far.app".into() }),
        ];
        let (layout, healed) = Layout::from_records(&records, 2, &AppCatalog::new());

        assert!(healed);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(path_at(&layout, 0, 0).as_deref(), Some("/a.app"));
        assert_eq!(path_at(&layout, 1, 0).as_deref(), Some("/far.app"));
    }

    #[test]
    fn test_from_records_keeps_interior_empty_page() {
        let mut records: Vec<_> = (0..2).map(|pos| record(0, pos, SlotPayload::Empty)).collect();
        records.extend((0..2).map(|pos| record(1, pos, SlotPayload::Empty)));
        records.push(record(2, 0, SlotPayload::App { path: "/c.app".into() }));
        records.push(record(2, 1, SlotPayload::Empty));

        let (layout, healed) = Layout::from_records(&records, 2, &AppCatalog::new());

        assert!(!healed);
        assert_eq!(layout.page_count(), 3);
        assert_eq!(path_at(&layout, 2, 0).as_deref(), Some("/c.app"));
    }

    #[test]
    fn test_from_records_drops_memberless_folder() {
        let records = vec![record(
            0,
            0,
            SlotPayload::Folder {
                id: "f".into(),
                name: "Empty".into(),
                members: vec![],
            },
        )];
        let (layout, healed) = Layout::from_records(&records, 1, &AppCatalog::new());
        assert!(healed);
        assert!(layout.get(SlotRef::new(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_move_within_page_shifts() {
        let mut layout = layout_with(5, &[&["/a", "/b", "/c", "/d", ""]]);
        layout.move_item(SlotRef::new(0, 0), SlotRef::new(0, 2)).unwrap();

        let order: Vec<_> = (0..4).map(|i| path_at(&layout, 0, i).unwrap()).collect();
        assert_eq!(order, vec!["/b", "/c", "/a", "/d"]);
        assert_eq!(layout.item_count(), 5);
    }

    #[test]
    fn test_move_across_pages_touches_only_two_pages() {
        let mut layout = layout_with(3, &[&["/a", "/b", "/c"], &["/d", "", ""], &["/e", "/f", ""]]);
        let untouched: Vec<_> = layout.pages[2].iter().map(GridItem::id).collect();

        layout.move_item(SlotRef::new(0, 0), SlotRef::new(1, 0)).unwrap();

        assert_eq!(path_at(&layout, 0, 0).as_deref(), Some("/b"));
        assert_eq!(path_at(&layout, 0, 1).as_deref(), Some("/c"));
        assert!(layout.get(SlotRef::new(0, 2)).unwrap().is_empty());
        assert_eq!(path_at(&layout, 1, 0).as_deref(), Some("/a"));
        assert_eq!(path_at(&layout, 1, 1).as_deref(), Some("/d"));

        let after: Vec<_> = layout.pages[2].iter().map(GridItem::id).collect();
        assert_eq!(untouched, after);
        assert_eq!(layout.item_count(), 9);
        assert_eq!(layout.real_item_count(), 6);
    }

    #[test]
    fn test_move_into_full_page_fails() {
        let mut layout = layout_with(2, &[&["/a", ""], &["/b", "/c"]]);
        let result = layout.move_item(SlotRef::new(0, 0), SlotRef::new(1, 0));
        assert!(matches!(result, Err(LayoutError::PageFull(1))));
    }

    #[test]
    fn test_move_onto_new_page() {
        let mut layout = layout_with(2, &[&["/a", "/b"]]);
        layout.move_item(SlotRef::new(0, 1), SlotRef::new(1, 0)).unwrap();

        assert_eq!(layout.page_count(), 2);
        assert_eq!(path_at(&layout, 1, 0).as_deref(), Some("/b"));
    }

    #[test]
    fn test_move_out_of_bounds() {
        let mut layout = layout_with(2, &[&["/a", "/b"]]);
        assert!(matches!(
            layout.move_item(SlotRef::new(0, 0), SlotRef::new(5, 0)),
            Err(LayoutError::SlotOutOfBounds(_))
        ));
    }

    #[test]
    fn test_merge_two_apps() {
        let mut layout = layout_with(6, &[&["/x", "/y", "/a", "/z", "/w", "/b"]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 2), SlotRef::new(0, 5), "Untitled")
            .unwrap();

        assert_eq!(folder.member_paths(), vec!["/b", "/a"]);
        assert!(layout.get(SlotRef::new(0, 2)).unwrap().is_empty());
        assert_eq!(
            layout.get(SlotRef::new(0, 5)).unwrap().as_folder().unwrap().id,
            folder.id
        );
    }

    #[test]
    fn test_merge_onto_folder_appends() {
        let mut layout = layout_with(4, &[&["/a", "/b", "/c", ""]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();
        let grown = layout
            .merge_into_folder(SlotRef::new(0, 2), SlotRef::new(0, 1), "ignored")
            .unwrap();

        assert_eq!(grown.id, folder.id);
        assert_eq!(grown.name, "F");
        assert_eq!(grown.member_paths(), vec!["/b", "/a", "/c"]);
        assert!(layout.get(SlotRef::new(0, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_merge_rejects_folder_and_empty() {
        let mut layout = layout_with(4, &[&["/a", "/b", "/c", ""]]);
        layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();

        assert!(matches!(
            layout.merge_into_folder(SlotRef::new(0, 1), SlotRef::new(0, 2), "F"),
            Err(LayoutError::InvalidMerge(_))
        ));
        assert!(matches!(
            layout.merge_into_folder(SlotRef::new(0, 2), SlotRef::new(0, 3), "F"),
            Err(LayoutError::EmptySlot(_))
        ));
    }

    #[test]
    fn test_split_keeps_single_member_folder() {
        let mut layout = layout_with(4, &[&["/a", "/b", "", ""]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();

        let outcome = layout.split_from_folder("/a", &folder.id, None, false).unwrap();

        let remaining = outcome.folder.unwrap();
        assert_eq!(remaining.member_paths(), vec!["/b"]);
        assert_eq!(layout.find_folder(&folder.id), Some(SlotRef::new(0, 1)));
        assert_eq!(outcome.placed_at, SlotRef::new(0, 0));
    }

    #[test]
    fn test_split_dissolve_round_trip() {
        let mut layout = layout_with(6, &[&["/x", "/y", "/a", "/z", "/w", "/b"]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 2), SlotRef::new(0, 5), "F")
            .unwrap();

        let outcome = layout.split_from_folder("/a", &folder.id, None, true).unwrap();

        assert!(outcome.folder.is_none());
        assert_eq!(path_at(&layout, 0, 2).as_deref(), Some("/a"));
        assert_eq!(path_at(&layout, 0, 5).as_deref(), Some("/b"));
    }

    #[test]
    fn test_split_last_member_empties_slot() {
        let mut layout = layout_with(3, &[&["/a", "/b", "/c"]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();
        layout.split_from_folder("/b", &folder.id, None, false).unwrap();

        let outcome = layout.split_from_folder("/a", &folder.id, None, false).unwrap();

        assert!(outcome.folder.is_none());
        assert!(layout.find_folder(&folder.id).is_none());
        // folder's own slot is the first free one on its page
        assert_eq!(outcome.placed_at, SlotRef::new(0, 1));
    }

    #[test]
    fn test_split_to_destination() {
        let mut layout = layout_with(3, &[&["/a", "/b", ""], &["", "", ""]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();

        let outcome = layout
            .split_from_folder("/a", &folder.id, Some(SlotRef::new(1, 2)), false)
            .unwrap();
        assert_eq!(outcome.placed_at, SlotRef::new(1, 2));
        assert_eq!(path_at(&layout, 1, 2).as_deref(), Some("/a"));
    }

    #[test]
    fn test_split_unknown_member() {
        let mut layout = layout_with(2, &[&["/a", "/b"]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();
        assert!(matches!(
            layout.split_from_folder("/nope", &folder.id, None, false),
            Err(LayoutError::NotFound(_))
        ));
    }

    #[test]
    fn test_compact_trailing_only() {
        let mut layout = layout_with(2, &[&["", ""], &["/a", ""], &["", ""], &["", ""]]);
        assert_eq!(layout.compact(), 2);
        assert_eq!(layout.page_count(), 2);
        assert!(layout.pages[0].iter().all(GridItem::is_empty));
    }

    #[test]
    fn test_compact_keeps_one_page() {
        let mut layout = layout_with(2, &[&["", ""], &["", ""]]);
        layout.compact();
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.page_capacity(), 2);
    }

    #[test]
    fn test_place_all_appends_pages() {
        let mut layout = layout_with(2, &[&["/a", ""]]);
        let placed = layout.place_all(vec![
            Application::unresolved("/b"),
            Application::unresolved("/c"),
        ]);

        assert_eq!(placed, 2);
        assert_eq!(path_at(&layout, 0, 1).as_deref(), Some("/b"));
        assert_eq!(path_at(&layout, 1, 0).as_deref(), Some("/c"));
    }

    #[test]
    fn test_rename_keeps_identity() {
        let mut layout = layout_with(2, &[&["/a", "/b"]]);
        let folder = layout
            .merge_into_folder(SlotRef::new(0, 0), SlotRef::new(0, 1), "F")
            .unwrap();
        let renamed = layout.rename_folder(&folder.id, "Games").unwrap();

        assert_eq!(renamed.id, folder.id);
        assert_eq!(renamed.name, "Games");
    }
}

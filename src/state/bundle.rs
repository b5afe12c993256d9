//! Export and import of layout bundles
//!
//! A bundle is a directory holding a copy of `layout.db` and the
//! `config.json` it was written with. Exported bundles carry both the
//! page-slot table and a linearized legacy table so older readers can
//! still import them.

use std::path::Path;
use tracing::{debug, info, warn};

use super::config::LayoutConfig;
use super::legacy::{linearize, write_legacy, LegacyStore};
use super::library::{Library, DB_FILE};
use super::pages::{check_collisions, PageStore};
use super::reconciler::{read_layout, Reconciler};
use crate::error::Result;

/// Whether `dir` holds a bundle whose layout rows can actually be read.
///
/// Page-slot rows must decode without slot collisions; with none present,
/// legacy rows must decode instead. The database is opened read-only and
/// any failure reads as "not a bundle".
pub fn is_valid_bundle(dir: &Path) -> bool {
    let db_path = dir.join(DB_FILE);
    if !db_path.is_file() {
        return false;
    }

    match Library::open_read_only(&db_path).and_then(|library| readable_rows(&library)) {
        Ok(rows) => rows > 0,
        Err(err) => {
            debug!(path = %db_path.display(), error = %err, "bundle database unreadable");
            false
        }
    }
}

/// Number of decodable layout rows, page-slot first, then legacy
fn readable_rows(library: &Library) -> Result<usize> {
    if library.has_table("page_entries")? {
        let records = PageStore::new(library.conn()).load_all()?;
        if !records.is_empty() {
            check_collisions(&records)?;
            return Ok(records.len());
        }
    }
    Ok(LegacyStore::new(library.conn()).load_all()?.len())
}

impl Reconciler {
    /// Write the stored layout and the current config into `dest`.
    ///
    /// An existing bundle database in `dest` is replaced.
    pub fn export_bundle(&self, dest: &Path) -> Result<()> {
        std::fs::create_dir_all(dest)?;
        let db_path = dest.join(DB_FILE);
        if db_path.exists() {
            std::fs::remove_file(&db_path)?;
        }

        self.library().snapshot_to(&db_path)?;

        let records = PageStore::new(self.library().conn()).load_all()?;
        if !records.is_empty() {
            let legacy = linearize(&records, self.config().page_capacity);
            let mut bundle = Library::open(&db_path)?;
            write_legacy(bundle.conn_mut(), &legacy)?;
        }

        self.config().save(dest)?;
        info!(dest = %dest.display(), slots = records.len(), "layout exported");
        Ok(())
    }

    /// Replace the stored layout with the bundle in `src` and reload.
    ///
    /// The bundle is copied next to the live database and loaded there
    /// first; only a copy that loads cleanly replaces the live file.
    /// Returns false without touching the live layout when `src` is not a
    /// valid bundle or its copy does not load.
    pub fn import_bundle(&mut self, src: &Path) -> Result<bool> {
        if !is_valid_bundle(src) {
            warn!(src = %src.display(), "not a layout bundle, import skipped");
            return Ok(false);
        }

        let staged = self.library().stage_from(&src.join(DB_FILE))?;

        let capacity = self.config().page_capacity;
        let checked = Library::open(&staged)
            .and_then(|library| read_layout(&library, capacity, self.catalog()));
        let layout = match checked {
            Ok(layout) => layout,
            Err(err) => {
                let _ = std::fs::remove_file(&staged);
                warn!(src = %src.display(), error = %err, "bundle does not load, import skipped");
                return Ok(false);
            }
        };

        self.library_mut().swap_in(&staged)?;
        self.adopt(layout);
        info!(src = %src.display(), "layout imported");
        Ok(true)
    }
}

/// Config shipped alongside a bundle, if any
pub fn bundle_config(dir: &Path) -> Result<LayoutConfig> {
    LayoutConfig::load(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::BlankIconResolver;
    use crate::state::catalog::AppCatalog;
    use crate::state::data::{Application, GridItem, SlotRef};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(capacity: usize) -> LayoutConfig {
        LayoutConfig {
            page_capacity: capacity,
            ..LayoutConfig::default()
        }
    }

    fn reconciler_in(dir: &Path, capacity: usize) -> Reconciler {
        Reconciler::new(
            Library::open_in(dir).unwrap(),
            config(capacity),
            AppCatalog::new(),
            Arc::new(BlankIconResolver),
        )
        .unwrap()
    }

    fn seeded(dir: &Path, paths: &[&str]) -> Reconciler {
        let mut reconciler = reconciler_in(dir, 4);
        reconciler.set_catalog(paths.iter().map(|p| Application::unresolved(*p)).collect());
        reconciler.load().unwrap();
        reconciler.sync_apps().unwrap();
        reconciler.persist().unwrap();
        reconciler
    }

    #[test]
    fn test_missing_dir_is_not_a_bundle() {
        let dir = TempDir::new().unwrap();
        assert!(!is_valid_bundle(&dir.path().join("nope")));
        assert!(!is_valid_bundle(dir.path()));
    }

    #[test]
    fn test_empty_database_is_not_a_bundle() {
        let dir = TempDir::new().unwrap();
        Library::open_in(dir.path()).unwrap();
        assert!(!is_valid_bundle(dir.path()));
    }

    #[test]
    fn test_garbage_file_is_not_a_bundle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DB_FILE), b"definitely not sqlite").unwrap();
        assert!(!is_valid_bundle(dir.path()));
    }

    #[test]
    fn test_validity_check_does_not_create_tables() {
        let dir = TempDir::new().unwrap();
        {
            let conn = rusqlite::Connection::open(dir.path().join(DB_FILE)).unwrap();
            conn.execute_batch("CREATE TABLE unrelated (x INTEGER)").unwrap();
        }

        assert!(!is_valid_bundle(dir.path()));

        let library = Library::open_read_only(&dir.path().join(DB_FILE)).unwrap();
        assert!(!library.has_table("page_entries").unwrap());
    }

    #[test]
    fn test_export_writes_both_schemas_and_config() {
        let live = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let reconciler = seeded(live.path(), &["/a", "/b", "/c", "/d", "/e"]);

        reconciler.export_bundle(out.path()).unwrap();

        assert!(is_valid_bundle(out.path()));
        assert_eq!(bundle_config(out.path()).unwrap().page_capacity, 4);

        let bundle = Library::open(&out.path().join(DB_FILE)).unwrap();
        assert_eq!(bundle.page_entry_count().unwrap(), 8);

        let legacy = LegacyStore::new(bundle.conn()).load_all().unwrap();
        assert_eq!(legacy.len(), 8);
        assert_eq!(legacy[4].item_id, "/e");
        assert_eq!(legacy[4].order_index, 4);
        assert_eq!(legacy[5].item_id, "empty-page-1-pos-1");
    }

    #[test]
    fn test_export_overwrites_previous_bundle() {
        let live = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let reconciler = seeded(live.path(), &["/a"]);

        reconciler.export_bundle(out.path()).unwrap();
        reconciler.export_bundle(out.path()).unwrap();

        assert!(is_valid_bundle(out.path()));
    }

    #[test]
    fn test_import_replaces_layout() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();

        seeded(source.path(), &["/x", "/y"]).export_bundle(out.path()).unwrap();
        let mut reconciler = seeded(target.path(), &["/a"]);

        assert!(reconciler.import_bundle(out.path()).unwrap());

        let first = reconciler
            .layout()
            .get(SlotRef::new(0, 0))
            .and_then(GridItem::as_app)
            .map(|a| a.path.clone());
        assert_eq!(first.as_deref(), Some("/x"));
        assert_eq!(reconciler.layout().real_item_count(), 2);
    }

    #[test]
    fn test_invalid_import_declined_silently() {
        let target = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        let mut reconciler = seeded(target.path(), &["/a"]);

        assert!(!reconciler.import_bundle(empty.path()).unwrap());
        assert_eq!(reconciler.layout().real_item_count(), 1);
        assert_eq!(reconciler.library().page_entry_count().unwrap(), 4);
    }

    #[test]
    fn test_import_legacy_only_bundle_migrates() {
        let out = TempDir::new().unwrap();
        {
            let mut bundle = Library::open_in(out.path()).unwrap();
            let records = vec![crate::state::data::LegacyRecord {
                item_id: "/old.app".to_string(),
                order_index: 7,
                payload: crate::state::data::SlotPayload::App {
                    path: "/old.app".to_string(),
                },
                created_at: chrono::DateTime::from_timestamp_millis(1_000).unwrap(),
                updated_at: chrono::DateTime::from_timestamp_millis(1_000).unwrap(),
            }];
            write_legacy(bundle.conn_mut(), &records).unwrap();
        }
        assert!(is_valid_bundle(out.path()));

        let target = TempDir::new().unwrap();
        let mut reconciler = reconciler_in(target.path(), 4);
        reconciler.load().unwrap();

        assert!(reconciler.import_bundle(out.path()).unwrap());
        assert_eq!(reconciler.layout().real_item_count(), 1);
        assert!(reconciler.validate_store().is_ok());
    }

    /// Bundle directory whose page table holds the given raw rows
    fn raw_bundle(rows: &[(&str, i64, i64, &str, Option<&str>)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let library = Library::open_in(dir.path()).unwrap();
        for (slot_id, page, pos, kind, path) in rows {
            library
                .conn()
                .execute(
                    "INSERT INTO page_entries
                        (slot_id, page_index, position, kind, app_path, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
                    rusqlite::params![slot_id, page, pos, kind, path],
                )
                .unwrap();
        }
        dir
    }

    fn stored_paths(dir: &Path) -> Vec<String> {
        let library = Library::open_in(dir).unwrap();
        PageStore::new(library.conn())
            .load_all()
            .unwrap()
            .into_iter()
            .filter_map(|r| match r.payload {
                crate::state::data::SlotPayload::App { path } => Some(path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_undecodable_bundle_declined_and_live_layout_kept() {
        let target = TempDir::new().unwrap();
        let bundle = raw_bundle(&[("page-0-pos-0", 0, 0, "widget", None)]);
        let mut reconciler = seeded(target.path(), &["/a", "/b"]);

        assert!(!is_valid_bundle(bundle.path()));
        assert!(!reconciler.import_bundle(bundle.path()).unwrap());
        drop(reconciler);

        assert_eq!(stored_paths(target.path()), vec!["/a", "/b"]);
        let mut reopened = reconciler_in(target.path(), 4);
        assert_eq!(reopened.load().unwrap().real_item_count(), 2);
    }

    #[test]
    fn test_colliding_bundle_declined() {
        let target = TempDir::new().unwrap();
        let bundle = raw_bundle(&[
            ("page-0-pos-0", 0, 0, "app", Some("/x")),
            ("page-0-pos-7", 0, 0, "app", Some("/y")),
        ]);
        let mut reconciler = seeded(target.path(), &["/a"]);

        assert!(!is_valid_bundle(bundle.path()));
        assert!(!reconciler.import_bundle(bundle.path()).unwrap());
        assert_eq!(stored_paths(target.path()), vec!["/a"]);
    }

    #[test]
    fn test_bundle_with_runaway_page_is_healed_on_import() {
        let target = TempDir::new().unwrap();
        let bundle = raw_bundle(&[("page-far", i64::MAX, 0, "app", Some("/far"))]);
        let mut reconciler = seeded(target.path(), &["/a"]);

        assert!(reconciler.import_bundle(bundle.path()).unwrap());

        assert_eq!(reconciler.layout().real_item_count(), 1);
        assert_eq!(stored_paths(target.path()), vec!["/far"]);
        assert!(reconciler.validate_store().is_ok());
        assert!(!reconciler.library().staging_path().unwrap().exists());
    }
}

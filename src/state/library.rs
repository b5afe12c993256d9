use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data::SlotPayload;
use crate::error::{LayoutError, Result};

/// File name of the layout database inside a data directory or bundle
pub const DB_FILE: &str = "layout.db";

/// The Library manages the SQLite layout database.
/// It stores the canonical page-slot table and the legacy top-item table.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the library inside a data directory
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Self::open(&data_dir.join(DB_FILE))
    }

    /// Open (or create) the library at an explicit database path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "layout database opened");

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Open an existing database without creating or altering anything.
    ///
    /// Used to inspect import candidates; the schema is not initialized.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Library {
            conn,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Directory where the layout lives by default:
    /// - Linux: ~/.local/share/launch-grid
    /// - macOS: ~/Library/Application Support/launch-grid
    /// - Windows: %APPDATA%\launch-grid
    pub fn default_data_dir() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("launch-grid");
        path
    }

    /// Initialize the database schema.
    /// Creates both layout tables and their indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        // Canonical table: one row per (page, position)
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS page_entries (
                slot_id         TEXT PRIMARY KEY,
                page_index      INTEGER NOT NULL,
                position        INTEGER NOT NULL,
                kind            TEXT NOT NULL,
                app_path        TEXT,
                folder_id       TEXT,
                folder_name     TEXT,
                app_paths       TEXT NOT NULL DEFAULT '[]',
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        // Legacy table: one row per item with a global order
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS top_items (
                id              TEXT PRIMARY KEY,
                kind            TEXT NOT NULL,
                order_index     INTEGER NOT NULL,
                app_path        TEXT,
                folder_name     TEXT,
                app_paths       TEXT NOT NULL DEFAULT '[]',
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_page_entries_slot
             ON page_entries(page_index, position)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_top_items_order
             ON top_items(order_index)",
            [],
        )?;

        debug!("layout schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Whether a table exists (import candidates may predate a table)
    pub fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count of canonical page-slot rows
    pub fn page_entry_count(&self) -> Result<i64> {
        self.count_rows("page_entries")
    }

    /// Count of legacy top-item rows
    pub fn legacy_count(&self) -> Result<i64> {
        self.count_rows("top_items")
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        if !self.has_table(table)? {
            return Ok(0);
        }
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Write a consistent copy of the database to `dest`
    pub fn snapshot_to(&self, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy().replace('\'', "''");
        self.conn.execute_batch(&format!("VACUUM INTO '{}'", dest))?;
        Ok(())
    }

    /// Copy the database at `source` next to the live file, ready for
    /// `swap_in`. The live database is not touched.
    pub fn stage_from(&self, source: &Path) -> Result<PathBuf> {
        let staged = self.staging_path()?;
        if let Err(err) = std::fs::copy(source, &staged) {
            let _ = std::fs::remove_file(&staged);
            return Err(err.into());
        }
        debug!(source = %source.display(), staged = %staged.display(), "layout database staged");
        Ok(staged)
    }

    /// Sibling path where an incoming database is prepared before the swap
    pub(crate) fn staging_path(&self) -> Result<PathBuf> {
        if self.is_in_memory() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "an in-memory layout cannot be replaced from a file",
            )
            .into());
        }
        let mut name = self
            .db_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DB_FILE.into());
        name.push(".incoming");
        Ok(self.db_path.with_file_name(name))
    }

    /// Move a staged database over the live file and reopen it.
    ///
    /// The staged file is removed on failure. The live connection is only
    /// replaced once the renamed file opens with a valid schema.
    pub fn swap_in(&mut self, staged: &Path) -> Result<()> {
        if let Err(err) = std::fs::rename(staged, &self.db_path) {
            let _ = std::fs::remove_file(staged);
            return Err(err.into());
        }

        let incoming = Library {
            conn: Connection::open(&self.db_path)?,
            db_path: self.db_path.clone(),
        };
        incoming.init_schema()?;

        let previous = std::mem::replace(self, incoming);
        if let Err((_, err)) = previous.conn.close() {
            debug!(error = %err, "previous layout connection closed with error");
        }
        info!(path = %self.db_path.display(), "layout database replaced");
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Delete every row in both layout tables
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM page_entries", [])?;
        tx.execute("DELETE FROM top_items", [])?;
        tx.commit()?;
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Current time at storage precision (milliseconds)
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Timestamps are stored as integer milliseconds
pub(crate) fn to_millis(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| LayoutError::InvalidRecord(format!("timestamp {} out of range", ms)))
}

/// Member paths are stored as a JSON array
pub(crate) fn encode_members(members: &[String]) -> Result<String> {
    Ok(serde_json::to_string(members)?)
}

pub(crate) fn decode_members(json: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(json)?)
}

/// Columns shared by both tables, as read from a row
pub(crate) struct PayloadColumns {
    pub kind: String,
    pub app_path: Option<String>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
    pub app_paths: String,
}

/// Turn the kind tag and its nullable columns into a payload
pub(crate) fn decode_payload(columns: PayloadColumns) -> Result<SlotPayload> {
    match columns.kind.as_str() {
        "app" => {
            let path = columns.app_path.ok_or_else(|| {
                LayoutError::InvalidRecord("app row without app_path".to_string())
            })?;
            Ok(SlotPayload::App { path })
        }
        "folder" => {
            let id = columns.folder_id.ok_or_else(|| {
                LayoutError::InvalidRecord("folder row without folder id".to_string())
            })?;
            Ok(SlotPayload::Folder {
                id,
                name: columns.folder_name.unwrap_or_default(),
                members: decode_members(&columns.app_paths)?,
            })
        }
        "empty" => Ok(SlotPayload::Empty),
        other => Err(LayoutError::InvalidRecord(format!("unknown kind '{}'", other))),
    }
}

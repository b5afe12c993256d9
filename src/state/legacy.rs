//! Legacy flat-ordering store (`top_items`)
//!
//! Older layouts kept one global `order_index` per item. This module only
//! reads that table and converts it into page-slot records. The single
//! writer, [`write_legacy`], exists for export bundles that older readers
//! must still understand; the live layout never writes here.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::data::{LegacyRecord, SlotPayload, SlotRecord, SlotRef};
use super::library::{decode_payload, encode_members, from_millis, to_millis, PayloadColumns};
use crate::error::{LayoutError, Result};

/// Read-only view of the legacy top-item table
pub struct LegacyStore<'a> {
    conn: &'a Connection,
}

impl<'a> LegacyStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All legacy records ordered by `order_index`, ties in insertion order.
    ///
    /// A missing table reads as empty.
    pub fn load_all(&self) -> Result<Vec<LegacyRecord>> {
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'top_items'",
            [],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, kind, order_index, app_path, folder_name, app_paths, created_at, updated_at
             FROM top_items
             ORDER BY order_index ASC, rowid ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, order_index, app_path, folder_name, app_paths, created, updated) = row?;
            let folder_id = (kind == "folder").then(|| id.clone());
            let payload = decode_payload(PayloadColumns {
                kind,
                app_path,
                folder_id,
                folder_name,
                app_paths,
            })?;
            records.push(LegacyRecord {
                item_id: id,
                order_index,
                payload,
                created_at: from_millis(created)?,
                updated_at: from_millis(updated)?,
            });
        }

        debug!(count = records.len(), "loaded legacy records");
        Ok(records)
    }

    /// Load and paginate the legacy table at a fixed capacity.
    ///
    /// An absent or empty table yields no records.
    pub fn migrate_to_pages(&self, page_capacity: usize) -> Result<Vec<SlotRecord>> {
        let legacy = self.load_all()?;
        let records = paginate(&legacy, page_capacity)?;
        if !records.is_empty() {
            info!(
                items = records.len(),
                pages = records.last().map(|r| r.slot.page_index + 1).unwrap_or(0),
                "migrated legacy layout"
            );
        }
        Ok(records)
    }
}

/// Assign the i-th ordered legacy record to page `i / capacity`,
/// position `i % capacity`. Payloads and timestamps are carried verbatim.
pub fn paginate(ordered: &[LegacyRecord], page_capacity: usize) -> Result<Vec<SlotRecord>> {
    if page_capacity == 0 {
        return Err(LayoutError::InvalidCapacity(
            "page capacity must be positive".to_string(),
        ));
    }

    Ok(ordered
        .iter()
        .enumerate()
        .map(|(i, legacy)| SlotRecord {
            slot: SlotRef::new(i / page_capacity, i % page_capacity),
            payload: legacy.payload.clone(),
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
        })
        .collect())
}

/// Flatten page-slot records back into legacy form with
/// `order_index = page_index * capacity + position`.
///
/// Empty slots keep a placeholder row so positions survive a re-import.
pub fn linearize(records: &[SlotRecord], page_capacity: usize) -> Vec<LegacyRecord> {
    let mut sorted: Vec<&SlotRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.slot);

    sorted
        .into_iter()
        .map(|record| {
            let item_id = match &record.payload {
                SlotPayload::App { path } => path.clone(),
                SlotPayload::Folder { id, .. } => id.clone(),
                SlotPayload::Empty => format!("empty-{}", record.slot_id()),
            };
            LegacyRecord {
                item_id,
                order_index: (record.slot.page_index * page_capacity + record.slot.position) as i64,
                payload: record.payload.clone(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            }
        })
        .collect()
}

/// Replace the legacy table contents in one transaction
pub fn write_legacy(conn: &mut Connection, records: &[LegacyRecord]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM top_items", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO top_items
                (id, kind, order_index, app_path, folder_name, app_paths, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for record in records {
            let (app_path, folder_name, members) = match &record.payload {
                SlotPayload::App { path } => (Some(path.as_str()), None, Vec::new()),
                SlotPayload::Folder { name, members, .. } => {
                    (None, Some(name.as_str()), members.clone())
                }
                SlotPayload::Empty => (None, None, Vec::new()),
            };
            stmt.execute(params![
                record.item_id,
                record.payload.kind_tag(),
                record.order_index,
                app_path,
                folder_name,
                encode_members(&members)?,
                to_millis(&record.created_at),
                to_millis(&record.updated_at),
            ])?;
        }
    }

    tx.commit()?;
    debug!(count = records.len(), "wrote legacy records");
    Ok(())
}

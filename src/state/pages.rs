//! Canonical page-slot store (`page_entries`)
//!
//! One row per (page, position). The slot id `page-{p}-pos-{n}` is the
//! primary key, so at most one record can claim a slot.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use super::data::{SlotPayload, SlotRecord, SlotRef};
use super::library::{
    decode_payload, encode_members, from_millis, now, to_millis, PayloadColumns,
};
use crate::error::{LayoutError, Result};

/// How `replace_all` stamps the rows it writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Set updated-at to now on every row
    Refresh,
    /// Keep the timestamps carried by the records (migration)
    Preserve,
}

const SELECT_COLUMNS: &str = "slot_id, page_index, position, kind, app_path, folder_id, \
                              folder_name, app_paths, created_at, updated_at";

/// Access to the canonical page-slot table
pub struct PageStore<'a> {
    conn: &'a Connection,
}

impl<'a> PageStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All records ordered by (page, position)
    pub fn load_all(&self) -> Result<Vec<SlotRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM page_entries ORDER BY page_index ASC, position ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([], read_columns)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(into_record(row?)?);
        }
        Ok(records)
    }

    pub fn get(&self, slot: SlotRef) -> Result<Option<SlotRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM page_entries WHERE slot_id = ?1", SELECT_COLUMNS),
                params![slot.slot_id()],
                read_columns,
            )
            .optional()?;

        row.map(into_record).transpose()
    }

    /// Insert or replace the record at its slot, refreshing updated-at.
    ///
    /// Without `replace`, a slot already holding a different payload fails
    /// with `DuplicateSlot`. Created-at of an existing row is kept.
    pub fn upsert(&self, record: &SlotRecord, replace: bool) -> Result<SlotRecord> {
        let existing = self.get(record.slot)?;

        let created_at = match &existing {
            Some(current) if current.payload != record.payload && !replace => {
                return Err(LayoutError::DuplicateSlot(record.slot_id()));
            }
            Some(current) => current.created_at,
            None => record.created_at,
        };

        let stored = SlotRecord {
            slot: record.slot,
            payload: record.payload.clone(),
            created_at,
            updated_at: now(),
        };
        write_row(self.conn, &stored)?;
        Ok(stored)
    }

    /// Rows whose stored slot id disagrees with their (page, position).
    ///
    /// Such rows load under the derived slot; a rewrite through
    /// `replace_all` stores them under the right id.
    pub fn stale_slot_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM page_entries
             WHERE slot_id != 'page-' || page_index || '-pos-' || position",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Remove the record at a slot. Absent slots are not an error.
    pub fn delete(&self, slot: SlotRef) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM page_entries WHERE slot_id = ?1",
            params![slot.slot_id()],
        )?;
        Ok(removed > 0)
    }

    /// Swap the whole table for `records` in one transaction.
    ///
    /// Rows whose slot keeps the same payload retain their created-at. Any
    /// failure rolls back and leaves the previous rows in place.
    pub fn replace_all(&self, records: &[SlotRecord], stamp: Stamp) -> Result<Vec<SlotRecord>> {
        check_collisions(records)?;

        let previous: HashMap<SlotRef, SlotRecord> = self
            .load_all()?
            .into_iter()
            .map(|record| (record.slot, record))
            .collect();

        let stamped_at = now();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM page_entries", [])?;

        let mut written = Vec::with_capacity(records.len());
        for record in records {
            let created_at = match previous.get(&record.slot) {
                Some(old) if old.payload == record.payload => old.created_at,
                _ => record.created_at,
            };
            let updated_at = match stamp {
                Stamp::Refresh => stamped_at,
                Stamp::Preserve => record.updated_at,
            };
            let stored = SlotRecord {
                slot: record.slot,
                payload: record.payload.clone(),
                created_at,
                updated_at,
            };
            write_row(&tx, &stored)?;
            written.push(stored);
        }

        tx.commit()?;
        debug!(count = written.len(), "page entries replaced");
        Ok(written)
    }
}

/// Check a record set: unique slots, positions within capacity, and every
/// page from 0 to the last one filled at positions `0..capacity`.
pub fn validate(records: &[SlotRecord], page_capacity: usize) -> Result<()> {
    check_collisions(records)?;

    for record in records {
        if record.slot.position >= page_capacity {
            return Err(LayoutError::PositionOutOfRange {
                slot_id: record.slot_id(),
                capacity: page_capacity,
            });
        }
    }

    let claimed: BTreeSet<SlotRef> = records.iter().map(|r| r.slot).collect();
    let Some(last_page) = claimed.iter().map(|s| s.page_index).max() else {
        return Ok(());
    };

    for page_index in 0..=last_page {
        for position in 0..page_capacity {
            if !claimed.contains(&SlotRef::new(page_index, position)) {
                return Err(LayoutError::Gap {
                    page_index,
                    position,
                });
            }
        }
    }
    Ok(())
}

/// Fail with every slot id claimed more than once
pub(crate) fn check_collisions(records: &[SlotRecord]) -> Result<()> {
    let mut claims: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *claims.entry(record.slot_id()).or_default() += 1;
    }

    let collided: Vec<String> = claims
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(slot_id, _)| slot_id)
        .collect();

    if collided.is_empty() {
        Ok(())
    } else {
        Err(LayoutError::SlotCollision(collided))
    }
}

fn write_row(conn: &Connection, record: &SlotRecord) -> Result<()> {
    let (app_path, folder_id, folder_name, members) = match &record.payload {
        SlotPayload::App { path } => (Some(path.as_str()), None, None, Vec::new()),
        SlotPayload::Folder { id, name, members } => {
            (None, Some(id.as_str()), Some(name.as_str()), members.clone())
        }
        SlotPayload::Empty => (None, None, None, Vec::new()),
    };

    conn.execute(
        "INSERT OR REPLACE INTO page_entries
            (slot_id, page_index, position, kind, app_path, folder_id, folder_name,
             app_paths, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.slot_id(),
            record.slot.page_index as i64,
            record.slot.position as i64,
            record.payload.kind_tag(),
            app_path,
            folder_id,
            folder_name,
            encode_members(&members)?,
            to_millis(&record.created_at),
            to_millis(&record.updated_at),
        ],
    )?;
    Ok(())
}

/// Raw column values of one `page_entries` row
struct RowColumns {
    slot_id: String,
    page_index: i64,
    position: i64,
    payload: PayloadColumns,
    created_at: i64,
    updated_at: i64,
}

fn read_columns(row: &Row<'_>) -> rusqlite::Result<RowColumns> {
    Ok(RowColumns {
        slot_id: row.get(0)?,
        page_index: row.get(1)?,
        position: row.get(2)?,
        payload: PayloadColumns {
            kind: row.get(3)?,
            app_path: row.get(4)?,
            folder_id: row.get(5)?,
            folder_name: row.get(6)?,
            app_paths: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn into_record(columns: RowColumns) -> Result<SlotRecord> {
    let page_index = usize::try_from(columns.page_index).map_err(|_| {
        LayoutError::InvalidRecord(format!("negative page index in {}", columns.slot_id))
    })?;
    let position = usize::try_from(columns.position).map_err(|_| {
        LayoutError::InvalidRecord(format!("negative position in {}", columns.slot_id))
    })?;

    // (page, position) is authoritative; two rows deriving the same slot
    // surface as a collision in `validate`
    let slot = SlotRef::new(page_index, position);
    if slot.slot_id() != columns.slot_id {
        warn!(stored = %columns.slot_id, derived = %slot, "slot id does not match its position");
    }

    Ok(SlotRecord {
        slot,
        payload: decode_payload(columns.payload)?,
        created_at: from_millis(columns.created_at)?,
        updated_at: from_millis(columns.updated_at)?,
    })
}

/// Timestamp of the newest write in a record set (None when empty)
pub fn last_updated(records: &[SlotRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|r| r.updated_at).max()
}

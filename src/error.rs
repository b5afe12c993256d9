//! Error types for layout operations

use thiserror::Error;

use crate::state::data::SlotRef;

/// Result type alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Main error type for layout persistence and mutation
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A different record already claims this slot id
    #[error("slot {0} is already claimed by a different record")]
    DuplicateSlot(String),

    /// Two or more records claim the same slot
    #[error("slot collision on {0:?}")]
    SlotCollision(Vec<String>),

    /// A position inside a page has no record
    #[error("gap at page {page_index}, position {position}")]
    Gap { page_index: usize, position: usize },

    /// A record sits beyond the page capacity
    #[error("slot {slot_id} is outside page capacity {capacity}")]
    PositionOutOfRange { slot_id: String, capacity: usize },

    /// Page capacity or cache capacity of zero
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Slot reference points outside the loaded pages
    #[error("slot {0} is out of bounds")]
    SlotOutOfBounds(SlotRef),

    /// Operation needs a real item but the slot is empty
    #[error("slot {0} is empty")]
    EmptySlot(SlotRef),

    /// The item at a slot is not the one the caller expected
    #[error("expected {expected} at slot, found {found}")]
    ItemMismatch { expected: String, found: String },

    /// Destination page has no empty slot to absorb a shift
    #[error("page {0} has no free slot")]
    PageFull(usize),

    /// Drop target or dragged item cannot form a folder
    #[error("invalid merge: {0}")]
    InvalidMerge(String),

    /// Item, folder or member could not be found
    #[error("not found: {0}")]
    NotFound(String),

    /// A persisted row could not be decoded
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Underlying SQLite failure
    #[error("persistence failure: {0}")]
    Persist(#[from] rusqlite::Error),

    /// Filesystem failure (export, import, config)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure (member lists, config)
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

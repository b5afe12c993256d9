//! Page-slot layout persistence and folder icon cache for a launcher grid.
//!
//! - `state`: data model, SQLite store, legacy migration, the in-memory
//!   layout and the reconciler that ties them together
//! - `icon`: fallback icon resolution and the bounded folder icon cache

pub mod error;
pub mod icon;
pub mod state;

pub use error::{LayoutError, Result};
pub use icon::{BlankIconResolver, FolderIconCache, IconResolver, RenderContext};
pub use state::bundle::is_valid_bundle;
pub use state::catalog::AppCatalog;
pub use state::config::LayoutConfig;
pub use state::data::{Application, Folder, GridItem, SlotPayload, SlotRecord, SlotRef};
pub use state::layout::{Layout, SplitOutcome};
pub use state::library::Library;
pub use state::reconciler::Reconciler;

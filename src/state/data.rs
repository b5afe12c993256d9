//! Shared data structures for the launcher layout
//!
//! These types represent the data model that flows between
//! the SQLite layer, the reconciler and the view layer.

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::library::now;
use crate::icon::{IconResolver, RenderContext};

/// Rendered image shared between the cache, items and the view layer
pub type Icon = Arc<image::RgbaImage>;

/// An application discovered on disk
///
/// Identity is the executable bundle path. Name and icon are resolved by the
/// discovery collaborator and may change transiently without changing identity.
#[derive(Debug, Clone)]
pub struct Application {
    /// Full path to the application bundle
    pub path: String,
    /// Localized display name
    pub name: String,
    /// Icon as resolved at discovery time (may be zero-sized)
    pub icon: Icon,
}

impl Application {
    pub fn new(path: impl Into<String>, name: impl Into<String>, icon: Icon) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            icon,
        }
    }

    /// Application known only by its stored path.
    ///
    /// The name falls back to the file stem and the icon is zero-sized, so
    /// rendering resolves a system icon live.
    pub fn unresolved(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());
        Self {
            path,
            name,
            icon: Arc::new(image::RgbaImage::new(0, 0)),
        }
    }

    /// Stable identity (the bundle path)
    pub fn id(&self) -> &str {
        &self.path
    }

    /// Icon to draw for this application.
    ///
    /// A zero-width or zero-height stored icon falls back to the resolver,
    /// and then to a blank image. Never fails.
    pub fn display_icon(&self, resolver: &dyn IconResolver) -> Icon {
        if self.icon.width() > 0 && self.icon.height() > 0 {
            return Arc::clone(&self.icon);
        }
        match resolver.icon_for_path(Path::new(&self.path)) {
            Some(icon) if icon.width() > 0 && icon.height() > 0 => Arc::new(icon),
            _ => crate::icon::blank_icon(),
        }
    }
}

impl PartialEq for Application {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Application {}

impl Hash for Application {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// A user folder holding an ordered list of applications
#[derive(Debug, Clone)]
pub struct Folder {
    /// Generated once at creation, never recomputed
    pub id: String,
    /// User-editable display name
    pub name: String,
    /// Members in display order (the first four make up the icon)
    pub apps: Vec<Application>,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Create a folder with a fresh identifier
    pub fn new(name: impl Into<String>, apps: Vec<Application>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            apps,
            created_at: now(),
        }
    }

    /// Identities of the first `limit` members, in order
    pub fn member_ids(&self, limit: usize) -> Vec<&str> {
        self.apps.iter().take(limit).map(Application::id).collect()
    }

    /// All member paths, in order
    pub fn member_paths(&self) -> Vec<String> {
        self.apps.iter().map(|app| app.path.clone()).collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.apps.iter().any(|app| app.path == path)
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Folder {}

/// Unique token carried by an empty placeholder slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmptyToken(String);

impl EmptyToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EmptyToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that can occupy a slot in the grid
#[derive(Debug, Clone)]
pub enum GridItem {
    Application(Application),
    Folder(Folder),
    Empty(EmptyToken),
}

impl GridItem {
    /// A fresh placeholder with its own token
    pub fn empty() -> Self {
        GridItem::Empty(EmptyToken::new())
    }

    /// Identity used for diffing in the view layer
    pub fn id(&self) -> String {
        match self {
            GridItem::Application(app) => format!("app_{}", app.path),
            GridItem::Folder(folder) => format!("folder_{}", folder.id),
            GridItem::Empty(token) => format!("empty_{}", token.as_str()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GridItem::Application(app) => &app.name,
            GridItem::Folder(folder) => &folder.name,
            GridItem::Empty(_) => "",
        }
    }

    /// Image to draw for this slot.
    ///
    /// Empty slots share the context's single placeholder instance.
    pub fn icon(&self, ctx: &RenderContext) -> Icon {
        match self {
            GridItem::Application(app) => app.display_icon(ctx.resolver()),
            GridItem::Folder(folder) => ctx.folder_icon(folder),
            GridItem::Empty(_) => ctx.placeholder(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GridItem::Empty(_))
    }

    pub fn as_app(&self) -> Option<&Application> {
        match self {
            GridItem::Application(app) => Some(app),
            _ => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            GridItem::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    /// Persistable payload for this item
    pub fn payload(&self) -> SlotPayload {
        match self {
            GridItem::Application(app) => SlotPayload::App {
                path: app.path.clone(),
            },
            GridItem::Folder(folder) => SlotPayload::Folder {
                id: folder.id.clone(),
                name: folder.name.clone(),
                members: folder.member_paths(),
            },
            GridItem::Empty(_) => SlotPayload::Empty,
        }
    }
}

impl PartialEq for GridItem {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Address of one cell in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef {
    pub page_index: usize,
    pub position: usize,
}

impl SlotRef {
    pub fn new(page_index: usize, position: usize) -> Self {
        Self {
            page_index,
            position,
        }
    }

    /// Composite id, e.g. "page-0-pos-3"
    pub fn slot_id(&self) -> String {
        format!("page-{}-pos-{}", self.page_index, self.position)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slot_id())
    }
}

/// Kind-specific content of a persisted slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPayload {
    App {
        path: String,
    },
    Folder {
        id: String,
        name: String,
        members: Vec<String>,
    },
    Empty,
}

impl SlotPayload {
    /// Kind tag stored in the `kind` column
    pub fn kind_tag(&self) -> &'static str {
        match self {
            SlotPayload::App { .. } => "app",
            SlotPayload::Folder { .. } => "folder",
            SlotPayload::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotPayload::Empty)
    }
}

/// Canonical persisted unit: what occupies one page-slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: SlotRef,
    pub payload: SlotPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlotRecord {
    /// New record stamped with the current time
    pub fn new(slot: SlotRef, payload: SlotPayload) -> Self {
        let at = now();
        Self {
            slot,
            payload,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn slot_id(&self) -> String {
        self.slot.slot_id()
    }
}

/// Superseded flat-ordering record, read only for migration and bundle checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    /// App path, folder id, or placeholder id
    pub item_id: String,
    /// Global order; gaps allowed, relative order matters
    pub order_index: i64,
    pub payload: SlotPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Icon rendering module
///
/// This module handles:
/// - Resolving fallback icons for applications (resolve.rs)
/// - Composing and caching folder icons (folder.rs)
/// - The shared transparent placeholder for empty slots

pub mod folder;
pub mod resolve;

use std::sync::Arc;

pub use folder::{CacheStats, FolderIconCache};
pub use resolve::{blank_icon, BlankIconResolver, IconResolver};

use crate::state::data::{Folder, Icon};

/// Side of folder icons requested by the grid when none is given
pub const DEFAULT_FOLDER_ICON_SIDE: u32 = 72;

/// Everything a grid item needs to produce its image.
///
/// Owns the one placeholder instance every empty slot hands out.
#[derive(Clone)]
pub struct RenderContext {
    placeholder: Icon,
    cache: Arc<FolderIconCache>,
    resolver: Arc<dyn IconResolver>,
    folder_icon_side: u32,
}

impl RenderContext {
    pub fn new(
        cache: Arc<FolderIconCache>,
        resolver: Arc<dyn IconResolver>,
        folder_icon_side: u32,
    ) -> Self {
        Self {
            // 1x1, zero-initialized = fully transparent
            placeholder: Arc::new(image::RgbaImage::new(1, 1)),
            cache,
            resolver,
            folder_icon_side,
        }
    }

    /// The shared empty-slot image (same allocation on every call)
    pub fn placeholder(&self) -> Icon {
        Arc::clone(&self.placeholder)
    }

    pub fn resolver(&self) -> &dyn IconResolver {
        self.resolver.as_ref()
    }

    pub fn cache(&self) -> &FolderIconCache {
        &self.cache
    }

    /// Folder icon at the configured grid side
    pub fn folder_icon(&self, folder: &Folder) -> Icon {
        self.folder_icon_sized(folder, self.folder_icon_side)
    }

    pub fn folder_icon_sized(&self, folder: &Folder, side: u32) -> Icon {
        self.cache.render(folder, side, self.resolver())
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("folder_icon_side", &self.folder_icon_side)
            .field("cache", &self.cache)
            .finish()
    }
}

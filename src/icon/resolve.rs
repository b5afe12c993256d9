//! Fallback icon resolution for applications whose stored icon is unusable

use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

use crate::state::data::Icon;

/// Looks up the system-provided icon for a bundle path.
///
/// Implemented by the platform layer; the core only calls it when an
/// application's stored icon has zero width or height.
pub trait IconResolver: Send + Sync {
    fn icon_for_path(&self, path: &Path) -> Option<RgbaImage>;
}

/// Resolver with no system icons; every lookup falls through to blank
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankIconResolver;

impl IconResolver for BlankIconResolver {
    fn icon_for_path(&self, _path: &Path) -> Option<RgbaImage> {
        None
    }
}

/// Transparent 1x1 image used when nothing else is available
pub fn blank_icon() -> Icon {
    Arc::new(RgbaImage::new(1, 1))
}

//! Folder icon composition and the bounded cache in front of it
//!
//! A folder icon is a 2x2 grid of the first four member icons. Any change to
//! the folder id, requested side or those four members yields a different
//! key, so cached entries are never invalidated in place.

use image::{imageops, imageops::FilterType, RgbaImage};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::IconResolver;
use crate::error::{LayoutError, Result};
use crate::state::data::{Application, Folder, Icon};

/// Default number of rendered icons kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Requested sides below this are rendered at this size
pub const MIN_ICON_SIDE: u32 = 16;

/// Members shown in a folder icon
pub const ICON_MEMBERS: usize = 4;

/// Clamp a requested side to the minimum renderable size
pub fn normalize_side(side: u32) -> u32 {
    side.max(MIN_ICON_SIDE)
}

/// Fingerprint for a folder icon: id, normalized side, first four member ids
pub fn cache_key(folder_id: &str, side: u32, member_ids: &[&str]) -> String {
    let members = member_ids
        .iter()
        .take(ICON_MEMBERS)
        .copied()
        .collect::<Vec<_>>()
        .join(",");
    format!("folderIcon:{}:{}:[{}]", folder_id, normalize_side(side), members)
}

/// Hit/miss counters for the folder icon cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Bounded LRU of rendered folder icons.
///
/// Lookup-or-insert runs under one lock, so concurrent renders of the same key
/// produce a single entry. Recency is refreshed on every hit.
pub struct FolderIconCache {
    entries: Mutex<LruCache<String, Icon>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FolderIconCache {
    /// Cache holding up to 256 icons
    pub fn new() -> Self {
        Self::from_capacity(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            LayoutError::InvalidCapacity("icon cache capacity must be positive".to_string())
        })?;
        Ok(Self::from_capacity(capacity))
    }

    fn from_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a rendered icon. A miss changes nothing.
    pub fn get(&self, folder_id: &str, side: u32, member_ids: &[&str]) -> Option<Icon> {
        let key = cache_key(folder_id, side, member_ids);
        self.entries.lock().get(&key).cloned()
    }

    /// Return the folder's icon, composing and caching it on a miss
    pub fn render(&self, folder: &Folder, side: u32, resolver: &dyn IconResolver) -> Icon {
        let key = cache_key(&folder.id, side, &folder.member_ids(ICON_MEMBERS));

        let mut entries = self.entries.lock();
        if let Some(icon) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(icon);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let icon: Icon = Arc::new(compose_folder_icon(&folder.apps, side, resolver));
        debug!(key = %key, "rendered folder icon");
        entries.put(key, Arc::clone(&icon));
        icon
    }

    /// Drop every cached icon (counters are kept)
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for FolderIconCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FolderIconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderIconCache")
            .field("stats", &self.stats())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Compose up to four member icons into a square 2x2 tile grid.
///
/// Outer inset is 12% of the side, inner inset 8% of the content rect, and
/// tiles are spaced by 4% of the inner rect (at least 2px). Output depends
/// only on the inputs.
pub fn compose_folder_icon(apps: &[Application], side: u32, resolver: &dyn IconResolver) -> RgbaImage {
    let side = normalize_side(side);
    let mut canvas = RgbaImage::new(side, side);

    let side_f = side as f32;
    let outer_inset = (side_f * 0.12).round();
    let content = side_f - 2.0 * outer_inset;
    let inner_inset = (content * 0.08).round();
    let inner = content - 2.0 * inner_inset;
    let spacing = (inner * 0.04).round().max(2.0);
    let tile = ((inner - spacing) / 2.0).floor();
    if tile < 1.0 {
        return canvas;
    }

    let tile_px = tile as u32;
    let origin = outer_inset + inner_inset;

    for (index, app) in apps.iter().take(ICON_MEMBERS).enumerate() {
        let row = (index / 2) as f32;
        let col = (index % 2) as f32;
        let x = origin + col * (tile + spacing);
        let y = origin + row * (tile + spacing);

        let icon = app.display_icon(resolver);
        let scaled = imageops::resize(&*icon, tile_px, tile_px, FilterType::Lanczos3);
        imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
    }

    canvas
}

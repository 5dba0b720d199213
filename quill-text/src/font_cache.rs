//! Per-face cache of size-bound shaping handles.
//!
//! Sizes are quantized to half pixels (`round(size * 2)`), so two requests
//! closer than 0.5px share a handle. The cache holds at most
//! `MAX_CACHED_SIZES` handles and drops the least recently used one when a
//! new size arrives.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::config::{is_valid_font_size, MAX_CACHED_SIZES};
use crate::font::FontFace;
use crate::shaping::ShapingFont;

/// Quantized cache key for `size`.
#[inline]
pub fn size_key(size: f32) -> u32 {
    (size * 2.0).round() as u32
}

pub struct FontCache {
    entries: LruCache<u32, ShapingFont>,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_SIZES)
    }

    /// Cache holding at most `capacity` sizes (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Shaping handle for `face` at `size`, created on a miss.
    ///
    /// `None` for out-of-range sizes or when the handle cannot be created.
    /// Nothing is inserted or evicted in that case.
    pub fn get_shaping_font(&mut self, face: &FontFace, size: f32) -> Option<&ShapingFont> {
        if !is_valid_font_size(size) {
            log::warn!("Rejected shaping font request at size {size}");
            return None;
        }
        let key = size_key(size);

        if !self.entries.contains(&key) {
            let font = ShapingFont::new(face, size)?;
            if let Some((evicted, _)) = self.entries.push(key, font) {
                if evicted != key {
                    log::debug!(
                        "Font cache for '{}' evicted size key {evicted}",
                        face.name()
                    );
                }
            }
        }
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_size(&self, size: f32) -> bool {
        self.entries.contains(&size_key(size))
    }

    /// Cached keys, most recently used first.
    pub fn cached_keys(&self) -> Vec<u32> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    /// Release every handle.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ===================================================================
// Tests
// ===================================================================

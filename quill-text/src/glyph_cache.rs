//! Rasterized glyph cache backed by a bounded set of atlas pages.
//!
//! Entries are keyed by face, glyph index and a 26.6 fixed-point size. A
//! miss rasterizes the glyph and packs it into a page. When no page has
//! room the cache reclaims space in this order:
//!
//! 1. open a new page while fewer than `max_atlases` exist,
//! 2. drop expired entries and reset every page left without entries,
//! 3. evict the least recently used page not touched in the current frame.
//!
//! If all of that fails the request is dropped and the glyph renders blank.
//!
//! Expiry runs from [`GlyphCache::begin_frame`] every `cleanup_interval`
//! frames. Space is never reclaimed mid-frame from a page that served a
//! glyph in that frame.

use std::collections::HashMap;

use crate::atlas::{AtlasRect, AtlasRegion, GlyphAtlas};
use crate::config::GlyphCacheConfig;
use crate::font::FaceId;
use crate::raster::GlyphBitmap;

/// Cache key: face identity, glyph index and quantized size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub face: FaceId,
    pub glyph_index: u32,
    /// `round(size * 64)`.
    pub size_key: u32,
}

impl GlyphKey {
    pub fn new(face: FaceId, glyph_index: u32, size: f32) -> Self {
        Self {
            face,
            glyph_index,
            size_key: (size * 64.0).round() as u32,
        }
    }

    /// Pixel size this key was built from.
    pub fn size(&self) -> f32 {
        self.size_key as f32 / 64.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphEntry {
    /// Page index. Meaningless for missing-glyph markers.
    pub atlas: usize,
    /// Pixel placement on the page. Empty for missing-glyph markers.
    pub rect: AtlasRect,
    pub region: AtlasRegion,
    /// Left and top bearing in pixels (top measured up from the baseline).
    pub bearing: [f32; 2],
    pub advance: f32,
    pub last_used_frame: u64,
}

impl GlyphEntry {
    fn missing(advance: f32, frame: u64) -> Self {
        Self {
            atlas: 0,
            rect: AtlasRect::default(),
            region: AtlasRegion::default(),
            bearing: [0.0, 0.0],
            advance,
            last_used_frame: frame,
        }
    }

    /// Glyph does not exist or has no pixels; render as blank advance.
    pub fn is_missing(&self) -> bool {
        self.rect.is_empty()
    }

    /// Bitmap width and height in pixels.
    pub fn size(&self) -> [f32; 2] {
        [self.rect.width as f32, self.rect.height as f32]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by page eviction.
    pub evictions: u64,
    /// Entries removed by expiry sweeps.
    pub expired: u64,
}

pub struct GlyphCache {
    config: GlyphCacheConfig,
    page_width: u32,
    page_height: u32,
    atlases: Vec<GlyphAtlas>,
    entries: HashMap<GlyphKey, GlyphEntry>,
    current_frame: u64,
    stats: GlyphCacheStats,
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::new(GlyphCacheConfig::default())
    }
}

impl GlyphCache {
    /// Empty cache. Pages are allocated on first use.
    pub fn new(config: GlyphCacheConfig) -> Self {
        Self {
            page_width: config.scaled_width(),
            page_height: config.scaled_height(),
            config,
            atlases: Vec::new(),
            entries: HashMap::new(),
            current_frame: 0,
            stats: GlyphCacheStats::default(),
        }
    }

    pub fn config(&self) -> &GlyphCacheConfig {
        &self.config
    }

    /// Advance the frame counter; runs the expiry sweep on interval
    /// boundaries.
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
        let interval = self.config.cleanup_interval as u64;
        if interval > 0 && self.current_frame % interval == 0 {
            self.sweep_expired();
        }
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Look up `key`, refreshing its last-used frame on a hit.
    pub fn get(&mut self, key: &GlyphKey) -> Option<&GlyphEntry> {
        let frame = self.current_frame;
        let entry = self.entries.get_mut(key)?;
        entry.last_used_frame = frame;
        if !entry.is_missing() {
            if let Some(atlas) = self.atlases.get_mut(entry.atlas) {
                atlas.touch(frame);
            }
        }
        self.stats.hits += 1;
        Some(&*entry)
    }

    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Cached entry for `key`, rasterizing with `rasterize` on a miss.
    ///
    /// Glyph index 0 and empty bitmaps are cached as missing-glyph markers
    /// without touching a page. `None` only when no space can be reclaimed.
    pub fn get_or_insert_with(
        &mut self,
        key: GlyphKey,
        rasterize: impl FnOnce() -> GlyphBitmap,
    ) -> Option<&GlyphEntry> {
        if self.entries.contains_key(&key) {
            return self.get(&key);
        }
        self.stats.misses += 1;
        let frame = self.current_frame;

        if key.glyph_index == 0 {
            log::trace!("Glyph index 0 requested for face {:?}", key.face);
            return Some(&*self.entries.entry(key).or_insert(GlyphEntry::missing(0.0, frame)));
        }

        let bitmap = rasterize();
        if bitmap.is_empty() {
            return Some(
                &*self
                    .entries
                    .entry(key)
                    .or_insert(GlyphEntry::missing(bitmap.advance, frame)),
            );
        }

        let padding = self.config.padding * 2;
        if bitmap.width + padding > self.page_width || bitmap.height + padding > self.page_height {
            log::warn!(
                "Glyph {} ({}x{}) does not fit an atlas page",
                key.glyph_index,
                bitmap.width,
                bitmap.height
            );
            return None;
        }

        let Some((index, rect)) = self.find_space(bitmap.width, bitmap.height) else {
            log::warn!(
                "Atlas budget exhausted, dropping glyph {} at size {}",
                key.glyph_index,
                key.size()
            );
            return None;
        };

        let atlas = &mut self.atlases[index];
        atlas.blit(&rect, &bitmap.data);
        atlas.add_entry(frame);
        let entry = GlyphEntry {
            atlas: index,
            rect,
            region: atlas.uv(&rect),
            bearing: [bitmap.left as f32, bitmap.top as f32],
            advance: bitmap.advance,
            last_used_frame: frame,
        };
        Some(&*self.entries.entry(key).or_insert(entry))
    }

    /// Remove entries unused for more than `expire_frames` frames and reset
    /// pages that no longer hold any entry. Returns the number removed.
    pub fn sweep_expired(&mut self) -> usize {
        let frame = self.current_frame;
        let expire = self.config.expire_frames as u64;
        let atlases = &mut self.atlases;

        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            let keep = frame.saturating_sub(entry.last_used_frame) <= expire;
            if !keep && !entry.is_missing() {
                if let Some(atlas) = atlases.get_mut(entry.atlas) {
                    atlas.remove_entry();
                }
            }
            keep
        });
        let removed = before - self.entries.len();

        for atlas in atlases.iter_mut() {
            if atlas.live_entries() == 0 && atlas.shelf_count() > 0 {
                atlas.reset();
            }
        }

        if removed > 0 {
            self.stats.expired += removed as u64;
            log::debug!("Glyph cache sweep at frame {frame} removed {removed} entries");
        }
        removed
    }

    /// Drop every entry and reset every page. Pages stay allocated.
    pub fn clear(&mut self) {
        self.entries.clear();
        for atlas in &mut self.atlases {
            atlas.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    pub fn atlas(&self, index: usize) -> Option<&GlyphAtlas> {
        self.atlases.get(index)
    }

    /// Take page `index`'s dirty region for upload.
    pub fn take_dirty(&mut self, index: usize) -> Option<AtlasRect> {
        self.atlases.get_mut(index)?.take_dirty()
    }

    pub fn stats(&self) -> GlyphCacheStats {
        self.stats
    }

    fn find_space(&mut self, width: u32, height: u32) -> Option<(usize, AtlasRect)> {
        if let Some(found) = self.allocate_in_existing(width, height) {
            return Some(found);
        }

        if self.atlases.len() < self.config.max_atlases {
            let mut atlas = GlyphAtlas::new(self.page_width, self.page_height, self.config.padding);
            let rect = atlas.allocate(width, height)?;
            self.atlases.push(atlas);
            log::debug!("Opened glyph atlas page {}", self.atlases.len() - 1);
            return Some((self.atlases.len() - 1, rect));
        }

        if self.sweep_expired() > 0 {
            if let Some(found) = self.allocate_in_existing(width, height) {
                return Some(found);
            }
        }

        let index = self.least_recently_used_page()?;
        self.evict_page(index);
        let rect = self.atlases[index].allocate(width, height)?;
        Some((index, rect))
    }

    fn allocate_in_existing(&mut self, width: u32, height: u32) -> Option<(usize, AtlasRect)> {
        self.atlases
            .iter_mut()
            .enumerate()
            .filter(|(_, atlas)| !atlas.is_full())
            .find_map(|(i, atlas)| atlas.allocate(width, height).map(|rect| (i, rect)))
    }

    /// Oldest page that served no glyph in the current frame.
    fn least_recently_used_page(&self) -> Option<usize> {
        self.atlases
            .iter()
            .enumerate()
            .filter(|(_, atlas)| atlas.last_used_frame() < self.current_frame)
            .min_by_key(|(_, atlas)| atlas.last_used_frame())
            .map(|(i, _)| i)
    }

    fn evict_page(&mut self, index: usize) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.is_missing() || entry.atlas != index);
        let evicted = before - self.entries.len();
        self.atlases[index].reset();
        self.stats.evictions += evicted as u64;
        log::debug!("Evicted glyph atlas page {index} ({evicted} entries)");
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontFace, FontFile};
    use crate::raster::Rasterizer;
    use crate::testing::{CountingRasterizer, SyntheticFont};

    fn square(n: u32) -> GlyphBitmap {
        GlyphBitmap {
            width: n,
            height: n,
            left: 0,
            top: n as i32,
            advance: n as f32,
            data: vec![255; (n * n) as usize],
        }
    }

    /// Pages of 64x64 with 1px padding hold four 30x30 glyphs each.
    fn small_cache(max_atlases: usize) -> GlyphCache {
        GlyphCache::new(GlyphCacheConfig {
            atlas_width: 64,
            atlas_height: 64,
            padding: 1,
            max_atlases,
            ..Default::default()
        })
    }

    fn key(glyph: u32) -> GlyphKey {
        GlyphKey::new(FaceId(0), glyph, 16.0)
    }

    fn test_face() -> FontFace {
        let file = FontFile::from_bytes("Synthetic", SyntheticFont::ascii(500).build()).unwrap();
        FontFace::from_file(&file, FaceId(0)).unwrap()
    }

    #[test]
    fn test_key_quantization() {
        let a = GlyphKey::new(FaceId(1), 5, 16.0);
        let b = GlyphKey::new(FaceId(1), 5, 16.001);
        let c = GlyphKey::new(FaceId(1), 5, 16.5);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(c.size(), 16.5);
    }

    #[test]
    fn test_hit_returns_same_region_without_rasterizing() {
        let face = test_face();
        let mut raster = CountingRasterizer::new();
        let mut cache = GlyphCache::default();
        let gid = face.glyph_index('A');
        let key = GlyphKey::new(face.id(), gid, 24.0);

        let first = *cache
            .get_or_insert_with(key, || raster.rasterize(&face, gid, 24.0))
            .unwrap();
        let second = *cache
            .get_or_insert_with(key, || raster.rasterize(&face, gid, 24.0))
            .unwrap();

        assert_eq!(raster.calls(), 1);
        assert!(!first.is_missing());
        assert_eq!(first.atlas, second.atlas);
        assert_eq!(first.rect, second.rect);
        assert_eq!(first.region, second.region);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_glyph_zero_is_missing_marker() {
        let mut cache = GlyphCache::default();
        let mut calls = 0;
        let entry = *cache
            .get_or_insert_with(key(0), || {
                calls += 1;
                square(4)
            })
            .unwrap();
        assert!(entry.is_missing());
        assert_eq!(calls, 0);
        assert_eq!(cache.atlas_count(), 0);
        assert!(cache.contains(&key(0)));
    }

    #[test]
    fn test_empty_bitmap_is_cached_missing() {
        let mut cache = GlyphCache::default();
        let entry = *cache
            .get_or_insert_with(key(3), || GlyphBitmap::empty(4.0))
            .unwrap();
        assert!(entry.is_missing());
        assert_eq!(entry.advance, 4.0);
        assert_eq!(cache.atlas_count(), 0);
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_entry_placement_and_pixels() {
        let mut cache = GlyphCache::default();
        let entry = *cache.get_or_insert_with(key(1), || square(10)).unwrap();
        assert_eq!(entry.size(), [10.0, 10.0]);
        assert_eq!(entry.bearing, [0.0, 10.0]);
        let atlas = cache.atlas(entry.atlas).unwrap();
        assert_eq!(atlas.pixel(entry.rect.x, entry.rect.y), 255);
        assert_eq!(atlas.live_entries(), 1);
        assert!(atlas.dirty_rect().is_some());
    }

    #[test]
    fn test_expiry_after_sweep() {
        let face = test_face();
        let mut raster = CountingRasterizer::new();
        let mut cache = GlyphCache::default();
        let gid = face.glyph_index('x');
        let key = GlyphKey::new(face.id(), gid, 16.0);
        cache.get_or_insert_with(key, || raster.rasterize(&face, gid, 16.0));

        // At frame 300 the entry is exactly 300 frames old: not yet expired.
        for _ in 0..300 {
            cache.begin_frame();
        }
        assert!(cache.contains(&key));

        // Old enough after frame 300, but not swept until the next boundary.
        for _ in 0..59 {
            cache.begin_frame();
        }
        assert_eq!(cache.current_frame(), 359);
        assert!(cache.contains(&key));

        cache.begin_frame();
        assert!(!cache.contains(&key));
        assert_eq!(cache.stats().expired, 1);
        assert_eq!(cache.atlas(0).unwrap().live_entries(), 0);

        cache.get_or_insert_with(key, || raster.rasterize(&face, gid, 16.0));
        assert_eq!(raster.calls(), 2);
    }

    #[test]
    fn test_used_entries_survive_sweeps() {
        let mut cache = GlyphCache::default();
        cache.get_or_insert_with(key(1), || square(4));
        for _ in 0..1000 {
            cache.begin_frame();
            assert!(cache.get(&key(1)).is_some());
        }
        assert_eq!(cache.stats().expired, 0);
    }

    #[test]
    fn test_opens_new_page_when_full() {
        let mut cache = small_cache(3);
        for glyph in 1..=5 {
            assert!(cache.get_or_insert_with(key(glyph), || square(30)).is_some());
        }
        assert_eq!(cache.atlas_count(), 2);
        assert_eq!(cache.get(&key(5)).unwrap().atlas, 1);
    }

    #[test]
    fn test_page_count_is_bounded() {
        let mut cache = small_cache(2);
        for glyph in 1..=40 {
            cache.begin_frame();
            cache.get_or_insert_with(key(glyph), || square(30));
            assert!(cache.atlas_count() <= 2);
        }
    }

    #[test]
    fn test_evicts_least_recently_used_page() {
        let mut cache = small_cache(2);
        for glyph in 1..=4 {
            cache.get_or_insert_with(key(glyph), || square(30));
        }
        cache.begin_frame();
        for glyph in 5..=8 {
            cache.get_or_insert_with(key(glyph), || square(30));
        }
        cache.begin_frame();
        // Page 0 becomes the most recent.
        cache.get(&key(1)).unwrap();

        let entry = *cache.get_or_insert_with(key(9), || square(30)).unwrap();
        assert_eq!(entry.atlas, 1);
        assert!(cache.contains(&key(1)));
        for glyph in 5..=8 {
            assert!(!cache.contains(&key(glyph)));
        }
        assert_eq!(cache.stats().evictions, 4);
        assert_eq!(cache.atlas(1).unwrap().live_entries(), 1);
    }

    #[test]
    fn test_expired_entries_reclaimed_before_lru() {
        let mut cache = small_cache(2);
        for glyph in 1..=4 {
            cache.get_or_insert_with(key(glyph), || square(30));
        }
        for _ in 0..301 {
            cache.begin_frame();
        }
        for glyph in 5..=8 {
            cache.get_or_insert_with(key(glyph), || square(30));
        }

        let entry = *cache.get_or_insert_with(key(9), || square(30)).unwrap();
        assert_eq!(entry.atlas, 0);
        assert_eq!(cache.stats().expired, 4);
        assert_eq!(cache.stats().evictions, 0);
        for glyph in 5..=8 {
            assert!(cache.contains(&key(glyph)));
        }
    }

    #[test]
    fn test_pages_used_this_frame_are_not_evicted() {
        let mut cache = small_cache(2);
        for glyph in 1..=8 {
            assert!(cache.get_or_insert_with(key(glyph), || square(30)).is_some());
        }
        assert!(cache.get_or_insert_with(key(9), || square(30)).is_none());
        for glyph in 1..=8 {
            assert!(cache.contains(&key(glyph)));
        }
    }

    #[test]
    fn test_short_glyph_fits_after_tall_miss_without_eviction() {
        let mut cache = small_cache(1);
        cache.get_or_insert_with(key(1), || square(30)).unwrap();
        let tall = GlyphBitmap {
            width: 20,
            height: 40,
            left: 0,
            top: 40,
            advance: 20.0,
            data: vec![255; 800],
        };
        // The only page was used this frame, so nothing can be evicted.
        assert!(cache.get_or_insert_with(key(2), || tall).is_none());

        cache.begin_frame();
        let entry = *cache.get_or_insert_with(key(3), || square(10)).unwrap();
        assert_eq!(entry.atlas, 0);
        assert!(cache.contains(&key(1)));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_oversized_glyph_rejected() {
        let mut cache = small_cache(2);
        assert!(cache.get_or_insert_with(key(1), || square(63)).is_none());
        assert_eq!(cache.atlas_count(), 0);
        assert!(!cache.contains(&key(1)));
    }

    #[test]
    fn test_clear_keeps_pages() {
        let mut cache = small_cache(2);
        for glyph in 1..=6 {
            cache.get_or_insert_with(key(glyph), || square(30));
        }
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.atlas_count(), 2);
        assert_eq!(cache.atlas(0).unwrap().live_entries(), 0);
    }

    #[test]
    fn test_take_dirty() {
        let mut cache = GlyphCache::default();
        cache.get_or_insert_with(key(1), || square(8));
        assert!(cache.take_dirty(0).is_some());
        assert!(cache.take_dirty(0).is_none());
        assert!(cache.take_dirty(5).is_none());
    }
}

//! Glyph atlas page: CPU-side coverage texture for glyph bitmaps.
//!
//! Uses a row-based "shelf" packer. Each shelf keeps the height of the
//! first glyph that opened it; a glyph goes on the first shelf with enough
//! height and horizontal room, otherwise a new shelf opens below the last
//! one. Every glyph is surrounded by `padding` empty pixels on all sides so
//! bilinear sampling never bleeds between neighbours.
//!
//! Pixels are single-channel (R8) coverage. The page records which region
//! changed since the last GPU upload.

/// A region within the atlas texture (UV coordinates normalized to [0,1]).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtlasRegion {
    /// Top-left U coordinate.
    pub u_min: f32,
    /// Top-left V coordinate.
    pub v_min: f32,
    /// Bottom-right U coordinate.
    pub u_max: f32,
    /// Bottom-right V coordinate.
    pub v_max: f32,
}

/// Pixel-space rectangle within a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &AtlasRect) -> AtlasRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        AtlasRect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn intersects(&self, other: &AtlasRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Shelf (row) in the atlas.
#[derive(Debug)]
struct Shelf {
    /// Y offset of this shelf.
    y: u32,
    /// Height including padding on both sides.
    height: u32,
    /// Next free X position.
    cursor_x: u32,
}

/// One atlas page.
#[derive(Debug)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    /// R8 pixel data (width * height bytes).
    data: Vec<u8>,
    shelves: Vec<Shelf>,
    padding: u32,
    /// Latched when an allocation fails and not even a 1x1 glyph still
    /// fits; cleared by `reset`.
    full: bool,
    /// Region modified since the last `take_dirty`.
    dirty: Option<AtlasRect>,
    /// Cache entries currently placed on this page.
    live_entries: usize,
    /// Most recent frame in which any entry on this page was used.
    last_used_frame: u64,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize],
            shelves: Vec::new(),
            padding,
            full: false,
            dirty: None,
            live_entries: 0,
            last_used_frame: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// Whole page, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Coverage value at (`x`, `y`), 0 outside the page.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }

    pub fn live_entries(&self) -> usize {
        self.live_entries
    }

    pub fn last_used_frame(&self) -> u64 {
        self.last_used_frame
    }

    pub(crate) fn add_entry(&mut self, frame: u64) {
        self.live_entries += 1;
        self.touch(frame);
    }

    pub(crate) fn remove_entry(&mut self) {
        self.live_entries = self.live_entries.saturating_sub(1);
    }

    pub(crate) fn touch(&mut self, frame: u64) {
        self.last_used_frame = self.last_used_frame.max(frame);
    }

    /// Reserve a `width` x `height` region. `None` when it does not fit.
    /// A failure marks the page full only once no shelf can take a 1x1
    /// glyph, so a tall miss does not hide room left for shorter glyphs.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        if width == 0 || height == 0 {
            return None;
        }
        let padded_w = width + self.padding * 2;
        let padded_h = height + self.padding * 2;

        // Try existing shelves.
        for shelf in &mut self.shelves {
            if shelf.height >= padded_h && shelf.cursor_x + padded_w <= self.width {
                let rect = AtlasRect {
                    x: shelf.cursor_x + self.padding,
                    y: shelf.y + self.padding,
                    width,
                    height,
                };
                shelf.cursor_x += padded_w;
                return Some(rect);
            }
        }

        // Start a new shelf.
        let shelf_y = self.shelves.last().map(|s| s.y + s.height).unwrap_or(0);
        if shelf_y + padded_h > self.height || padded_w > self.width {
            self.full = !self.fits(1, 1);
            return None;
        }

        self.shelves.push(Shelf {
            y: shelf_y,
            height: padded_h,
            cursor_x: padded_w,
        });
        Some(AtlasRect {
            x: self.padding,
            y: shelf_y + self.padding,
            width,
            height,
        })
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        let padded_w = width + self.padding * 2;
        let padded_h = height + self.padding * 2;
        if padded_w > self.width {
            return false;
        }
        let on_shelf = self
            .shelves
            .iter()
            .any(|s| s.height >= padded_h && s.cursor_x + padded_w <= self.width);
        let shelf_y = self.shelves.last().map(|s| s.y + s.height).unwrap_or(0);
        on_shelf || shelf_y + padded_h <= self.height
    }

    /// Copy a row-major coverage bitmap into `rect`. Rows missing from
    /// `bitmap` are left untouched.
    pub fn blit(&mut self, rect: &AtlasRect, bitmap: &[u8]) {
        if rect.is_empty() || rect.right() > self.width || rect.bottom() > self.height {
            return;
        }
        let row_len = rect.width as usize;
        for (row, src) in bitmap.chunks_exact(row_len).take(rect.height as usize).enumerate() {
            let start = ((rect.y as usize + row) * self.width as usize) + rect.x as usize;
            self.data[start..start + row_len].copy_from_slice(src);
        }
        self.mark_dirty(*rect);
    }

    /// Convert pixel rect to normalized UV region.
    pub fn uv(&self, rect: &AtlasRect) -> AtlasRegion {
        let inv_w = 1.0 / self.width as f32;
        let inv_h = 1.0 / self.height as f32;
        AtlasRegion {
            u_min: rect.x as f32 * inv_w,
            v_min: rect.y as f32 * inv_h,
            u_max: rect.right() as f32 * inv_w,
            v_max: rect.bottom() as f32 * inv_h,
        }
    }

    /// Region changed since the last upload.
    pub fn dirty_rect(&self) -> Option<AtlasRect> {
        self.dirty
    }

    /// Take the dirty region, leaving the page clean.
    pub fn take_dirty(&mut self) -> Option<AtlasRect> {
        self.dirty.take()
    }

    /// Forget every placement and clear the pixels. The whole page becomes
    /// dirty so the GPU copy is cleared as well.
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.shelves.clear();
        self.full = false;
        self.live_entries = 0;
        self.dirty = Some(AtlasRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        });
    }

    fn mark_dirty(&mut self, rect: AtlasRect) {
        self.dirty = Some(match self.dirty {
            Some(existing) => existing.union(&rect),
            None => rect,
        });
    }
}

// ===================================================================
// Tests
// ===================================================================

//! Fixed limits of the text pipeline and the per-context glyph cache
//! configuration built from them.

/// Smallest font size (pixels) any query accepts.
pub const MIN_FONT_SIZE: f32 = 1.0;
/// Largest font size (pixels) any query accepts.
pub const MAX_FONT_SIZE: f32 = 500.0;
/// Size used when a caller has no preference.
pub const DEFAULT_FONT_SIZE: f32 = 11.0;
/// Maximum number of fonts a [`FontManager`](crate::FontManager) holds.
pub const MAX_FONTS: usize = 64;
/// Maximum size-bound shaping handles kept per face.
pub const MAX_CACHED_SIZES: usize = 8;

/// Atlas page width before DPI scaling.
pub const BASE_ATLAS_WIDTH: u32 = 1024;
/// Atlas page height before DPI scaling.
pub const BASE_ATLAS_HEIGHT: u32 = 1024;
/// Empty pixels kept on every side of a glyph in the atlas.
pub const GLYPH_PADDING: u32 = 2;
/// Hard cap on atlas pages.
pub const MAX_ATLASES: usize = 8;
/// Frames a glyph may go unused before it becomes eligible for removal.
pub const GLYPH_EXPIRE_FRAMES: u32 = 300;
/// Frames between expiry sweeps.
pub const CLEANUP_INTERVAL_FRAMES: u32 = 60;

/// Glyphs processed per text run; longer runs are truncated.
pub const MAX_GLYPHS_PER_TEXT: usize = 1024;
/// Bytes of text accepted per run.
pub const MAX_TEXT_LENGTH: usize = 8192;
/// Quads a single [`TextBatch`](crate::TextBatch) accepts before it must be flushed.
pub const MAX_COMMANDS_PER_LIST: usize = 10_000;
/// Advance of an unmapped space, as a fraction of the font size.
pub const SPACE_ADVANCE_FALLBACK: f32 = 0.25;
/// Shaped runs remembered by the text renderer.
pub const SHAPED_TEXT_CACHE_SIZE: usize = 256;
/// (font, character) availability answers remembered by the font manager.
pub const GLYPH_AVAILABILITY_CACHE_SIZE: usize = 4096;

/// Whether `size` lies in `[MIN_FONT_SIZE, MAX_FONT_SIZE]`. NaN is rejected.
#[inline]
pub fn is_valid_font_size(size: f32) -> bool {
    (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size)
}

/// Glyph cache settings. `Default` matches the constants above.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphCacheConfig {
    /// Unscaled page width in pixels.
    pub atlas_width: u32,
    /// Unscaled page height in pixels.
    pub atlas_height: u32,
    /// Padding on each side of a glyph.
    pub padding: u32,
    /// Maximum number of pages.
    pub max_atlases: usize,
    /// Frames before an unused entry expires.
    pub expire_frames: u32,
    /// Frames between expiry sweeps.
    pub cleanup_interval: u32,
    /// Display scale factor applied to page dimensions.
    pub dpi_scale: f32,
}

impl Default for GlyphCacheConfig {
    fn default() -> Self {
        Self {
            atlas_width: BASE_ATLAS_WIDTH,
            atlas_height: BASE_ATLAS_HEIGHT,
            padding: GLYPH_PADDING,
            max_atlases: MAX_ATLASES,
            expire_frames: GLYPH_EXPIRE_FRAMES,
            cleanup_interval: CLEANUP_INTERVAL_FRAMES,
            dpi_scale: 1.0,
        }
    }
}

impl GlyphCacheConfig {
    /// Default configuration at the given display scale.
    pub fn with_dpi_scale(dpi_scale: f32) -> Self {
        Self {
            dpi_scale,
            ..Default::default()
        }
    }

    /// DPI scale with non-positive or non-finite values replaced by 1.0.
    pub fn effective_dpi_scale(&self) -> f32 {
        if self.dpi_scale.is_finite() && self.dpi_scale > 0.0 {
            self.dpi_scale
        } else {
            1.0
        }
    }

    /// Page width after DPI scaling.
    pub fn scaled_width(&self) -> u32 {
        (self.atlas_width as f32 * self.effective_dpi_scale()).round() as u32
    }

    /// Page height after DPI scaling.
    pub fn scaled_height(&self) -> u32 {
        (self.atlas_height as f32 * self.effective_dpi_scale()).round() as u32
    }
}

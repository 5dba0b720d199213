//! Glyph rasterization boundary.
//!
//! The glyph cache calls a [`Rasterizer`] on every miss. [`SwashRasterizer`]
//! is the production implementation; tests substitute their own to count
//! calls.

use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;
use swash::FontRef;

use crate::font::FontFace;

/// 8-bit coverage bitmap of one glyph, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge.
    pub left: i32,
    /// Offset from the baseline up to the top edge.
    pub top: i32,
    pub advance: f32,
    /// `width * height` bytes.
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    /// Zero-sized bitmap that still carries an advance.
    pub fn empty(advance: f32) -> Self {
        Self {
            advance,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

pub trait Rasterizer {
    /// Render `glyph_index` of `face` at `size` pixels. Failures give an
    /// empty bitmap.
    fn rasterize(&mut self, face: &FontFace, glyph_index: u32, size: f32) -> GlyphBitmap;
}

/// Rasterizer backed by `swash`, reusing one scale context across calls.
pub struct SwashRasterizer {
    context: ScaleContext,
}

impl Default for SwashRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SwashRasterizer {
    pub fn new() -> Self {
        Self {
            context: ScaleContext::new(),
        }
    }
}

impl Rasterizer for SwashRasterizer {
    fn rasterize(&mut self, face: &FontFace, glyph_index: u32, size: f32) -> GlyphBitmap {
        let Ok(glyph_id) = u16::try_from(glyph_index) else {
            return GlyphBitmap::default();
        };
        let Some(font) = FontRef::from_index(face.data(), face.face_index() as usize) else {
            return GlyphBitmap::default();
        };
        let advance = font.glyph_metrics(&[]).scale(size).advance_width(glyph_id);

        let mut scaler = self.context.builder(font).size(size).hint(true).build();
        let image = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ])
        .format(Format::Alpha)
        .render(&mut scaler, glyph_id);

        let Some(image) = image else {
            return GlyphBitmap::empty(advance);
        };
        let width = image.placement.width;
        let height = image.placement.height;
        let pixels = (width * height) as usize;

        // Color glyphs are reduced to their alpha channel.
        let data = match image.content {
            Content::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
            Content::SubpixelMask => image.data.chunks_exact(4).map(|px| px[1]).collect(),
            Content::Mask => image.data,
        };
        if data.len() != pixels {
            return GlyphBitmap::empty(advance);
        }

        GlyphBitmap {
            width,
            height,
            left: image.placement.left,
            top: image.placement.top,
            advance,
            data,
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

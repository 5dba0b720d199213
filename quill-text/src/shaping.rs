//! Size-bound shaping handles on top of `rustybuzz`.
//!
//! A [`ShapingFont`] is what a [`FontCache`](crate::FontCache) entry owns:
//! the face's shared bytes plus the pixel size it is bound to. The shaping
//! engine's face view borrows the bytes, so it is rebuilt for every call;
//! parsing is lazy and does not allocate.

use std::sync::Arc;

use rustybuzz::ttf_parser::Tag;
use rustybuzz::{Direction, Feature, Language, UnicodeBuffer};

use crate::config::{is_valid_font_size, MAX_GLYPHS_PER_TEXT};
use crate::font::{FaceId, FontFace};
use crate::text_utils::{detect_text_script, language_for_script};

/// One glyph out of the shaping engine, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph index in the face. 0 means the font has no glyph.
    pub glyph_index: u32,
    /// Byte offset of the source cluster in the shaped text.
    pub cluster: u32,
    pub x_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Ordered output of a shaping call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphRun {
    pub glyphs: Vec<ShapedGlyph>,
    /// Sum of the kept glyphs' advances.
    pub advance: f32,
    /// The engine produced more than `MAX_GLYPHS_PER_TEXT` glyphs.
    pub truncated: bool,
}

impl GlyphRun {
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }
}

/// Shaping handle bound to one face at one pixel size.
#[derive(Clone)]
pub struct ShapingFont {
    face_id: FaceId,
    data: Arc<[u8]>,
    face_index: u32,
    size: f32,
    scale: f32,
}

impl ShapingFont {
    /// Bind `face` at `size`. `None` for out-of-range sizes or bytes the
    /// shaping engine rejects.
    pub fn new(face: &FontFace, size: f32) -> Option<Self> {
        if !is_valid_font_size(size) {
            return None;
        }
        let data = face.shared_data();
        rustybuzz::Face::from_slice(&data, face.face_index())?;
        Some(Self {
            face_id: face.id(),
            data,
            face_index: face.face_index(),
            size,
            scale: size / face.units_per_em(),
        })
    }

    pub fn face_id(&self) -> FaceId {
        self.face_id
    }

    /// Pixel size this handle is bound to.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Pixels per font unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Shape `text` left to right with the script and language detected
    /// from its contents and kerning off. Keeps at most
    /// `MAX_GLYPHS_PER_TEXT` glyphs.
    pub fn shape(&self, text: &str) -> GlyphRun {
        if text.is_empty() {
            return GlyphRun::default();
        }
        let Some(face) = rustybuzz::Face::from_slice(&self.data, self.face_index) else {
            return GlyphRun::default();
        };

        let output = rustybuzz::shape(&face, &shaping_features(), shaping_buffer(text));

        let infos = output.glyph_infos();
        let positions = output.glyph_positions();
        let truncated = infos.len() > MAX_GLYPHS_PER_TEXT;

        let mut run = GlyphRun {
            glyphs: Vec::with_capacity(infos.len().min(MAX_GLYPHS_PER_TEXT)),
            advance: 0.0,
            truncated,
        };
        for (info, pos) in infos.iter().zip(positions).take(MAX_GLYPHS_PER_TEXT) {
            let glyph = ShapedGlyph {
                glyph_index: info.glyph_id,
                cluster: info.cluster,
                x_advance: pos.x_advance as f32 * self.scale,
                x_offset: pos.x_offset as f32 * self.scale,
                y_offset: pos.y_offset as f32 * self.scale,
            };
            run.advance += glyph.x_advance;
            run.glyphs.push(glyph);
        }

        if truncated {
            log::debug!(
                "Shaped run truncated from {} to {} glyphs",
                infos.len(),
                MAX_GLYPHS_PER_TEXT
            );
        }
        run
    }
}

/// Buffer holding `text` with direction, script and language set.
pub fn shaping_buffer(text: &str) -> UnicodeBuffer {
    let script = detect_text_script(text);
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.set_direction(Direction::LeftToRight);
    buffer.set_script(script.shaping_script());
    if let Ok(language) = language_for_script(script).parse::<Language>() {
        buffer.set_language(language);
    }
    buffer
}

/// Features applied to every run: kerning disabled.
pub fn shaping_features() -> [Feature; 1] {
    [Feature::new(Tag::from_bytes(b"kern"), 0, ..)]
}

impl std::fmt::Debug for ShapingFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapingFont")
            .field("face_id", &self.face_id)
            .field("size", &self.size)
            .finish()
    }
}

// ===================================================================
// Tests
// ===================================================================

//! Font files and parsed faces.
//!
//! [`FontFile`] owns the raw bytes of a TrueType/OpenType file (or one face
//! of a collection). [`FontFace`] validates those bytes with the shaping
//! engine's parser and answers metric queries at a requested pixel size.
//!
//! The parsed table view borrows the bytes, so the face keeps the bytes in an
//! `Arc<[u8]>` and re-creates the (lazy, allocation-free) parser view per
//! query. Face-level constants are extracted once at creation.

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustybuzz::ttf_parser::{self, GlyphId};

use crate::config::{is_valid_font_size, SPACE_ADVANCE_FALLBACK};
use crate::error::FontError;

/// Identity of a face inside a rendering context. Part of every glyph key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

// ── Font file ───────────────────────────────────────────────────────

/// Raw font bytes loaded from memory or disk. Immutable once loaded.
#[derive(Clone)]
pub struct FontFile {
    name: String,
    path: Option<PathBuf>,
    data: Arc<[u8]>,
    face_index: u32,
}

impl FontFile {
    /// Take ownership of an in-memory font.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, FontError> {
        if data.is_empty() {
            return Err(FontError::EmptyData);
        }
        Ok(Self {
            name: name.into(),
            path: None,
            data: data.into(),
            face_index: 0,
        })
    }

    /// Read a whole font file from disk.
    pub fn from_path(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::from_bytes(name, data)?;
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Select a face within a font collection (`.ttc`). Defaults to 0.
    pub fn with_face_index(mut self, face_index: u32) -> Self {
        self.face_index = face_index;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source path when loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

impl fmt::Debug for FontFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFile")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

/// Face-level metrics at a given size, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascender: f32,
    /// Negative below the baseline.
    pub descender: f32,
    pub line_height: f32,
    pub max_advance: f32,
}

impl FontMetrics {
    pub fn is_valid(&self) -> bool {
        self.ascender.is_finite()
            && self.descender.is_finite()
            && self.line_height.is_finite()
            && self.max_advance.is_finite()
            && self.line_height > 0.0
    }
}

/// Per-glyph metrics at a given size, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// 0 when the codepoint has no glyph.
    pub glyph_index: u32,
    /// Left and top bearing (top is measured upward from the baseline).
    pub bearing: [f32; 2],
    /// Bitmap width and height.
    pub size: [f32; 2],
    pub advance: f32,
}

impl GlyphMetrics {
    pub fn is_valid(&self) -> bool {
        self.bearing.iter().chain(self.size.iter()).all(|v| v.is_finite())
            && self.advance.is_finite()
            && self.advance >= 0.0
    }
}

// ── Font face ───────────────────────────────────────────────────────

/// A validated face with a Unicode character map.
///
/// Not `Sync`: the active character size is interior state, mirroring a
/// rasterizer face whose size is set before each query.
pub struct FontFace {
    id: FaceId,
    name: String,
    data: Arc<[u8]>,
    face_index: u32,
    units_per_em: f32,
    ascender: i16,
    descender: i16,
    height: i16,
    max_advance: u16,
    char_size: Cell<Option<f32>>,
}

impl FontFace {
    /// Parse `file` and select its Unicode character map.
    ///
    /// Fails when the data is empty, not a parsable font, or has no Unicode
    /// `cmap` subtable.
    pub fn from_file(file: &FontFile, id: FaceId) -> Result<Self, FontError> {
        if !file.is_valid() {
            return Err(FontError::EmptyData);
        }
        let face = ttf_parser::Face::parse(&file.data, file.face_index)
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let has_unicode_cmap = face
            .tables()
            .cmap
            .map(|cmap| cmap.subtables.into_iter().any(|s| s.is_unicode()))
            .unwrap_or(false);
        if !has_unicode_cmap {
            return Err(FontError::NoUnicodeCmap);
        }

        let max_advance = (0..face.number_of_glyphs())
            .filter_map(|g| face.glyph_hor_advance(GlyphId(g)))
            .max()
            .unwrap_or(0);

        Ok(Self {
            id,
            name: file.name.clone(),
            data: Arc::clone(&file.data),
            face_index: file.face_index,
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender(),
            descender: face.descender(),
            height: face.height(),
            max_advance,
            char_size: Cell::new(None),
        })
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Size recorded by the last successful [`set_char_size`](Self::set_char_size).
    pub fn char_size(&self) -> Option<f32> {
        self.char_size.get()
    }

    /// Make `size` the active size. Fails outside the supported range.
    pub fn set_char_size(&self, size: f32) -> bool {
        if !is_valid_font_size(size) {
            return false;
        }
        self.char_size.set(Some(size));
        true
    }

    /// Scale font units to pixels at `size`.
    #[inline]
    pub fn scale(&self, units: f32, size: f32) -> f32 {
        units * size / self.units_per_em
    }

    /// Ascender, descender, line height and widest advance at `size`.
    pub fn metrics(&self, size: f32) -> FontMetrics {
        if !self.set_char_size(size) {
            return FontMetrics::default();
        }
        FontMetrics {
            ascender: self.scale(self.ascender as f32, size),
            descender: self.scale(self.descender as f32, size),
            line_height: self.scale(self.height as f32, size),
            max_advance: self.scale(self.max_advance as f32, size),
        }
    }

    /// Line height at `size`, 0 when out of range.
    pub fn text_height(&self, size: f32) -> f32 {
        self.metrics(size).line_height
    }

    /// Glyph index for `ch`, 0 when unmapped.
    pub fn glyph_index(&self, ch: char) -> u32 {
        self.parsed()
            .and_then(|face| face.glyph_index(ch))
            .map(|g| g.0 as u32)
            .unwrap_or(0)
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyph_index(ch) != 0
    }

    /// Bearing, bitmap size and advance of the glyph for `ch` at `size`.
    pub fn glyph_metrics(&self, ch: char, size: f32) -> GlyphMetrics {
        if !self.set_char_size(size) {
            return GlyphMetrics::default();
        }
        let Some(face) = self.parsed() else {
            return GlyphMetrics::default();
        };
        let Some(gid) = face.glyph_index(ch) else {
            return GlyphMetrics::default();
        };

        let advance = face
            .glyph_hor_advance(gid)
            .map(|a| self.scale(a as f32, size))
            .unwrap_or(0.0);

        let (bearing, bitmap_size) = match face.glyph_bounding_box(gid) {
            Some(bbox) => {
                let left = self.scale(bbox.x_min as f32, size).floor();
                let right = self.scale(bbox.x_max as f32, size).ceil();
                let bottom = self.scale(bbox.y_min as f32, size).floor();
                let top = self.scale(bbox.y_max as f32, size).ceil();
                ([left, top], [right - left, top - bottom])
            }
            None => ([0.0, 0.0], [0.0, 0.0]),
        };

        GlyphMetrics {
            glyph_index: gid.0 as u32,
            bearing,
            size: bitmap_size,
            advance,
        }
    }

    /// Sum of horizontal advances without shaping.
    ///
    /// U+FFFD is skipped. An unmapped space advances by a quarter of the
    /// size; any other unmapped character adds nothing.
    pub fn measure_text(&self, text: &str, size: f32) -> f32 {
        if text.is_empty() || !self.set_char_size(size) {
            return 0.0;
        }
        let Some(face) = self.parsed() else {
            return 0.0;
        };

        let mut width = 0.0;
        for ch in text.chars() {
            if ch == char::REPLACEMENT_CHARACTER {
                continue;
            }
            match face.glyph_index(ch) {
                Some(gid) => {
                    if let Some(adv) = face.glyph_hor_advance(gid) {
                        width += self.scale(adv as f32, size);
                    }
                }
                None if ch == ' ' => width += size * SPACE_ADVANCE_FALLBACK,
                None => {}
            }
        }
        width
    }

    /// [`measure_text`](Self::measure_text) over raw bytes, decoded lossily.
    pub fn measure_utf8(&self, bytes: &[u8], size: f32) -> f32 {
        self.measure_text(&String::from_utf8_lossy(bytes), size)
    }

    fn parsed(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticFont;

    fn test_face(advance: u16) -> FontFace {
        let file = FontFile::from_bytes("Synthetic", SyntheticFont::ascii(advance).build()).unwrap();
        FontFace::from_file(&file, FaceId(0)).unwrap()
    }

    #[test]
    fn test_font_file_rejects_empty() {
        assert!(matches!(FontFile::from_bytes("empty", Vec::new()), Err(FontError::EmptyData)));
    }

    #[test]
    fn test_font_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.ttf");
        std::fs::write(&path, SyntheticFont::ascii(500).build()).unwrap();

        let file = FontFile::from_path(&path, "Mono").unwrap();
        assert!(file.is_valid());
        assert_eq!(file.name(), "Mono");
        assert_eq!(file.path(), Some(path.as_path()));
        assert!(FontFace::from_file(&file, FaceId(3)).is_ok());
    }

    #[test]
    fn test_font_file_missing_path() {
        let err = FontFile::from_path("/definitely/not/here.ttf", "Missing").unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn test_face_rejects_garbage() {
        let file = FontFile::from_bytes("garbage", vec![0xAB; 64]).unwrap();
        assert!(matches!(FontFace::from_file(&file, FaceId(0)), Err(FontError::Parse(_))));
    }

    #[test]
    fn test_metrics_scaled() {
        let face = test_face(500);
        let m = face.metrics(20.0);
        assert_eq!(m.ascender, 16.0);
        assert_eq!(m.descender, -4.0);
        assert_eq!(m.line_height, 20.0);
        assert_eq!(m.max_advance, 10.0);
        assert!(m.is_valid());
        assert_eq!(face.char_size(), Some(20.0));
    }

    #[test]
    fn test_out_of_range_sizes_are_zero() {
        let face = test_face(500);
        for size in [0.0, 0.5, -3.0, 500.5, 10_000.0, f32::NAN] {
            assert_eq!(face.metrics(size), FontMetrics::default());
            assert!(!face.metrics(size).is_valid());
            assert_eq!(face.glyph_metrics('a', size), GlyphMetrics::default());
            assert_eq!(face.measure_text("abc", size), 0.0);
        }
    }

    #[test]
    fn test_glyph_metrics() {
        let face = test_face(500);
        let m = face.glyph_metrics('a', 20.0);
        assert_ne!(m.glyph_index, 0);
        assert_eq!(m.advance, 10.0);
        // Outline spans x 50..450, y 0..700 in a 1000 upem font.
        assert_eq!(m.bearing, [1.0, 14.0]);
        assert_eq!(m.size, [8.0, 14.0]);
        assert!(m.is_valid());
    }

    #[test]
    fn test_glyph_metrics_unmapped() {
        let face = test_face(500);
        assert_eq!(face.glyph_metrics('\u{4E00}', 20.0), GlyphMetrics::default());
        assert_eq!(face.glyph_index(' '), 0);
        assert!(!face.has_glyph(' '));
        assert!(face.has_glyph('Z'));
    }

    #[test]
    fn test_measure_empty() {
        let face = test_face(500);
        assert_eq!(face.measure_text("", 20.0), 0.0);
    }

    #[test]
    fn test_measure_monospace_sum() {
        // 10 units per em at size 1000 would be absurd; use 500 units at 20px = 10px.
        let face = test_face(500);
        let text = "Hello,World!";
        assert_eq!(face.measure_text(text, 20.0), 10.0 * text.len() as f32);
    }

    #[test]
    fn test_measure_space_fallback() {
        let face = test_face(500);
        // Space is unmapped in the synthetic font: 0.25 * 20 = 5.
        assert_eq!(face.measure_text("a b", 20.0), 25.0);
        assert_eq!(face.measure_text("   ", 40.0), 30.0);
    }

    #[test]
    fn test_measure_skips_unmapped_and_replacement() {
        let face = test_face(500);
        assert_eq!(face.measure_text("a\u{4E00}b", 20.0), 20.0);
        assert_eq!(face.measure_utf8(b"a\xFFb", 20.0), 20.0);
    }

    #[test]
    fn test_text_height() {
        let face = test_face(500);
        assert_eq!(face.text_height(10.0), 10.0);
        assert_eq!(face.text_height(0.0), 0.0);
    }
}

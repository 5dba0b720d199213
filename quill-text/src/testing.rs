//! Synthetic TrueType fonts for tests and benchmarks.
//!
//! [`SyntheticFont`] writes a minimal but complete `glyf`-flavoured font:
//! every mapped character gets its own glyph whose outline is a filled
//! rectangle, and every glyph has the same advance width. Glyph 0 is an
//! empty `.notdef`. The space character is deliberately left unmapped.
//!
//! Metrics are fixed so tests can compute exact expectations:
//! units per em 1000, ascender 800, descender -200, no line gap.

use crate::font::FontFace;
use crate::raster::{GlyphBitmap, Rasterizer, SwashRasterizer};

/// Units per em of every synthetic font.
pub const UNITS_PER_EM: u16 = 1000;
/// Ascender in font units.
pub const ASCENDER: i16 = 800;
/// Descender in font units.
pub const DESCENDER: i16 = -200;
/// Top of every glyph outline in font units.
pub const GLYPH_TOP: i16 = 700;

/// Builder for a monospace font covering a set of codepoint ranges.
#[derive(Clone, Debug)]
pub struct SyntheticFont {
    advance: u16,
    ranges: Vec<(u32, u32)>,
}

impl SyntheticFont {
    /// Font with the printable ASCII range `!`..=`~` mapped (space excluded).
    pub fn ascii(advance: u16) -> Self {
        Self {
            advance,
            ranges: vec![(0x21, 0x7E)],
        }
    }

    /// Font with only the given inclusive codepoint ranges mapped.
    pub fn with_ranges(advance: u16, ranges: &[(u32, u32)]) -> Self {
        Self {
            advance,
            ranges: ranges.to_vec(),
        }
    }

    /// Number of glyphs including `.notdef`.
    pub fn glyph_count(&self) -> u16 {
        let mapped: u32 = self.ranges.iter().map(|(s, e)| e - s + 1).sum();
        (mapped + 1) as u16
    }

    /// Serialize to TrueType bytes.
    pub fn build(&self) -> Vec<u8> {
        let num_glyphs = self.glyph_count();
        let x_min = (self.advance / 10) as i16;
        let x_max = (self.advance - self.advance / 10) as i16;

        let tables: [(&[u8; 4], Vec<u8>); 7] = [
            (b"cmap", self.cmap()),
            (b"glyf", glyf(num_glyphs, x_min, x_max)),
            (b"head", head(x_min, x_max)),
            (b"hhea", self.hhea(num_glyphs, x_min, x_max)),
            (b"hmtx", self.hmtx(num_glyphs, x_min)),
            (b"loca", loca(num_glyphs)),
            (b"maxp", maxp(num_glyphs)),
        ];

        let num_tables = tables.len() as u16;
        let mut out = Vec::new();
        put_u32(&mut out, 0x0001_0000);
        put_u16(&mut out, num_tables);
        // searchRange, entrySelector, rangeShift for 7 tables.
        put_u16(&mut out, 64);
        put_u16(&mut out, 2);
        put_u16(&mut out, num_tables * 16 - 64);

        let mut offset = 12 + 16 * tables.len() as u32;
        let mut body = Vec::new();
        for (tag, data) in &tables {
            out.extend_from_slice(*tag);
            put_u32(&mut out, checksum(data));
            put_u32(&mut out, offset);
            put_u32(&mut out, data.len() as u32);

            body.extend_from_slice(data);
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 12 + 16 * tables.len() as u32 + body.len() as u32;
        }
        out.extend_from_slice(&body);
        out
    }

    fn cmap(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u16(&mut t, 0);
        put_u16(&mut t, 1);
        // Windows, Unicode full repertoire.
        put_u16(&mut t, 3);
        put_u16(&mut t, 10);
        put_u32(&mut t, 12);

        // Format 12 subtable.
        let groups = self.ranges.len() as u32;
        put_u16(&mut t, 12);
        put_u16(&mut t, 0);
        put_u32(&mut t, 16 + 12 * groups);
        put_u32(&mut t, 0);
        put_u32(&mut t, groups);
        let mut next_glyph = 1u32;
        for &(start, end) in &self.ranges {
            put_u32(&mut t, start);
            put_u32(&mut t, end);
            put_u32(&mut t, next_glyph);
            next_glyph += end - start + 1;
        }
        t
    }

    fn hhea(&self, num_glyphs: u16, x_min: i16, x_max: i16) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_i16(&mut t, ASCENDER);
        put_i16(&mut t, DESCENDER);
        put_i16(&mut t, 0);
        put_u16(&mut t, self.advance);
        put_i16(&mut t, x_min);
        put_i16(&mut t, self.advance as i16 - x_max);
        put_i16(&mut t, x_max);
        put_i16(&mut t, 1);
        put_i16(&mut t, 0);
        put_i16(&mut t, 0);
        for _ in 0..4 {
            put_i16(&mut t, 0);
        }
        put_i16(&mut t, 0);
        put_u16(&mut t, num_glyphs);
        t
    }

    fn hmtx(&self, num_glyphs: u16, x_min: i16) -> Vec<u8> {
        let mut t = Vec::new();
        put_u16(&mut t, self.advance);
        put_i16(&mut t, 0);
        for _ in 1..num_glyphs {
            put_u16(&mut t, self.advance);
            put_i16(&mut t, x_min);
        }
        t
    }
}

/// [`Rasterizer`] wrapper that counts how often it is asked to render.
#[derive(Default)]
pub struct CountingRasterizer {
    inner: SwashRasterizer,
    calls: usize,
}

impl CountingRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(&mut self, face: &FontFace, glyph_index: u32, size: f32) -> GlyphBitmap {
        self.calls += 1;
        self.inner.rasterize(face, glyph_index, size)
    }
}

/// Bytes of one outline glyph record, padded to a 4-byte boundary.
const GLYPH_RECORD_LEN: u32 = 36;

fn head(x_min: i16, x_max: i16) -> Vec<u8> {
    let mut t = Vec::new();
    put_u32(&mut t, 0x0001_0000);
    put_u32(&mut t, 0x0001_0000);
    put_u32(&mut t, 0);
    put_u32(&mut t, 0x5F0F_3CF5);
    put_u16(&mut t, 0x0003);
    put_u16(&mut t, UNITS_PER_EM);
    t.extend_from_slice(&[0u8; 16]);
    put_i16(&mut t, x_min);
    put_i16(&mut t, 0);
    put_i16(&mut t, x_max);
    put_i16(&mut t, GLYPH_TOP);
    put_u16(&mut t, 0);
    put_u16(&mut t, 8);
    put_i16(&mut t, 2);
    // Long loca offsets.
    put_i16(&mut t, 1);
    put_i16(&mut t, 0);
    t
}

fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut t = Vec::new();
    put_u32(&mut t, 0x0001_0000);
    put_u16(&mut t, num_glyphs);
    put_u16(&mut t, 4);
    put_u16(&mut t, 1);
    put_u16(&mut t, 0);
    put_u16(&mut t, 0);
    put_u16(&mut t, 2);
    for _ in 0..8 {
        put_u16(&mut t, 0);
    }
    t
}

fn glyf(num_glyphs: u16, x_min: i16, x_max: i16) -> Vec<u8> {
    let mut t = Vec::new();
    let width = x_max - x_min;
    for _ in 1..num_glyphs {
        put_i16(&mut t, 1);
        put_i16(&mut t, x_min);
        put_i16(&mut t, 0);
        put_i16(&mut t, x_max);
        put_i16(&mut t, GLYPH_TOP);
        put_u16(&mut t, 3);
        put_u16(&mut t, 0);
        // All points on-curve, coordinates stored as i16 deltas.
        t.extend_from_slice(&[0x01; 4]);
        for dx in [x_min, width, 0, -width] {
            put_i16(&mut t, dx);
        }
        for dy in [0, 0, GLYPH_TOP, 0] {
            put_i16(&mut t, dy);
        }
        t.extend_from_slice(&[0, 0]);
    }
    t
}

fn loca(num_glyphs: u16) -> Vec<u8> {
    let mut t = Vec::new();
    // .notdef has no outline: offsets 0 and 0.
    put_u32(&mut t, 0);
    for i in 1..=num_glyphs as u32 {
        put_u32(&mut t, (i - 1) * GLYPH_RECORD_LEN);
    }
    t
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

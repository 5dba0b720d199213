//! Text renderer: shaping, glyph lookup and vertex generation.
//!
//! A run goes through three steps:
//!
//! ```text
//! text ──segment by font──► shape each segment (FontCache handle)
//!      ──► ShapedText { positioned glyph indices }
//!      ──► GlyphCache lookup / rasterize ──► TextBatch { quads per atlas }
//! ```
//!
//! Shaping and rasterization happen at `size * dpi_scale`; every position
//! handed back is in logical pixels. Coordinates are y-down and the origin
//! passed to [`TextRenderer::generate_vertices`] is the left end of the
//! baseline.

use std::num::NonZeroUsize;

use bytemuck::{Pod, Zeroable};
use lru::LruCache;

use crate::config::{
    is_valid_font_size, GlyphCacheConfig, MAX_COMMANDS_PER_LIST, MAX_FONT_SIZE,
    MAX_GLYPHS_PER_TEXT, MAX_TEXT_LENGTH, MIN_FONT_SIZE, SHAPED_TEXT_CACHE_SIZE,
};
use crate::font_cache::size_key;
use crate::glyph_cache::{GlyphCache, GlyphKey};
use crate::manager::{FontFallbackChain, FontHandle, FontManager};
use crate::raster::{Rasterizer, SwashRasterizer};
use crate::text_utils::segment_text;

// ── Vertex output ───────────────────────────────────────────────────

/// One corner of a glyph quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Consecutive quads sampling the same atlas page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasDraw {
    pub atlas: usize,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

impl AtlasDraw {
    pub fn quad_count(&self) -> u32 {
        self.vertex_count / 4
    }
}

/// Flat vertex buffer plus the atlas page each range samples.
///
/// Quads are four vertices in the order top-left, top-right, bottom-left,
/// bottom-right. A batch holds at most `max_quads` quads; once full it must
/// be flushed by the caller.
#[derive(Clone, Debug)]
pub struct TextBatch {
    vertices: Vec<TextVertex>,
    draws: Vec<AtlasDraw>,
    max_quads: usize,
}

impl Default for TextBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBatch {
    pub fn new() -> Self {
        Self::with_max_quads(MAX_COMMANDS_PER_LIST)
    }

    pub fn with_max_quads(max_quads: usize) -> Self {
        Self {
            vertices: Vec::new(),
            draws: Vec::new(),
            max_quads,
        }
    }

    /// Append a quad. Returns `false`, leaving the batch unchanged, when the
    /// batch is full.
    pub fn push_quad(&mut self, atlas: usize, quad: [TextVertex; 4]) -> bool {
        if self.is_full() {
            return false;
        }
        let first_vertex = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        match self.draws.last_mut() {
            Some(draw) if draw.atlas == atlas => draw.vertex_count += 4,
            _ => self.draws.push(AtlasDraw {
                atlas,
                first_vertex,
                vertex_count: 4,
            }),
        }
        true
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    pub fn is_full(&self) -> bool {
        self.quad_count() >= self.max_quads
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[TextVertex] {
        &self.vertices
    }

    pub fn draws(&self) -> &[AtlasDraw] {
        &self.draws
    }

    /// Empty the batch after it has been submitted.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.draws.clear();
    }
}

// ── Shaped text ─────────────────────────────────────────────────────

/// A glyph placed relative to the run's baseline origin, logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub font: FontHandle,
    pub glyph_index: u32,
    /// Byte offset of the source cluster in the run's text.
    pub cluster: usize,
    pub x: f32,
    /// Vertical offset, y-down.
    pub y: f32,
    pub advance: f32,
}

/// Result of shaping a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedText {
    pub glyphs: Vec<PositionedGlyph>,
    /// Total advance in logical pixels.
    pub width: f32,
    /// Logical font size the run was shaped at.
    pub size: f32,
    /// Input past `MAX_TEXT_LENGTH` bytes or glyphs past
    /// `MAX_GLYPHS_PER_TEXT` were dropped.
    pub truncated: bool,
}

impl ShapedText {
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapedKey {
    text: String,
    chain: FontFallbackChain,
    /// Font used for codepoints no chain font covers; the manager's default
    /// when the chain is empty.
    fallback: FontHandle,
    size_key: u32,
}

/// Longest prefix of `text` no longer than `max_bytes`, cut at a char
/// boundary.
pub fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ── Renderer ────────────────────────────────────────────────────────

pub struct TextRenderer<R = SwashRasterizer> {
    glyph_cache: GlyphCache,
    rasterizer: R,
    shaped_cache: LruCache<ShapedKey, ShapedText>,
    dpi_scale: f32,
}

impl TextRenderer<SwashRasterizer> {
    /// Renderer with default cache limits at `dpi_scale`.
    pub fn new(dpi_scale: f32) -> Self {
        Self::with_rasterizer(GlyphCacheConfig::with_dpi_scale(dpi_scale), SwashRasterizer::new())
    }
}

impl<R: Rasterizer> TextRenderer<R> {
    pub fn with_rasterizer(config: GlyphCacheConfig, rasterizer: R) -> Self {
        let dpi_scale = config.effective_dpi_scale();
        let capacity = NonZeroUsize::new(SHAPED_TEXT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            glyph_cache: GlyphCache::new(config),
            rasterizer,
            shaped_cache: LruCache::new(capacity),
            dpi_scale,
        }
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.glyph_cache
    }

    pub fn glyph_cache_mut(&mut self) -> &mut GlyphCache {
        &mut self.glyph_cache
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Start a frame. Expiry sweeps run from here.
    pub fn begin_frame(&mut self) {
        self.glyph_cache.begin_frame();
    }

    /// Drop shaped runs and cached glyphs.
    pub fn clear_caches(&mut self) {
        self.shaped_cache.clear();
        self.glyph_cache.clear();
    }

    pub fn shaped_cache_len(&self) -> usize {
        self.shaped_cache.len()
    }

    /// Shape `text` with the fonts of `chain` at `size` logical pixels.
    ///
    /// Text past `MAX_TEXT_LENGTH` bytes is ignored and at most
    /// `MAX_GLYPHS_PER_TEXT` glyphs are kept; either cut sets `truncated`.
    /// Invalid sizes and empty text give an empty result.
    pub fn shape_text(
        &mut self,
        fonts: &mut FontManager,
        text: &str,
        chain: &FontFallbackChain,
        size: f32,
    ) -> ShapedText {
        let empty = ShapedText {
            size,
            ..Default::default()
        };
        if text.is_empty() || !is_valid_font_size(size) {
            return empty;
        }
        let Some(fallback) = chain.primary().or(fonts.default_font()) else {
            return empty;
        };

        let input_len = text.len();
        let text = truncate_to_boundary(text, MAX_TEXT_LENGTH);
        let key = ShapedKey {
            text: text.to_owned(),
            chain: chain.clone(),
            fallback,
            size_key: size_key(size),
        };
        if let Some(cached) = self.shaped_cache.get(&key) {
            return cached.clone();
        }

        let dpi = self.dpi_scale;
        let scaled_size = (size * dpi).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let segments = segment_text(text, |ch| {
            fonts.select_font_for_codepoint(ch, chain).unwrap_or(fallback)
        });

        let mut shaped = ShapedText {
            glyphs: Vec::with_capacity(text.len().min(MAX_GLYPHS_PER_TEXT)),
            size,
            truncated: text.len() < input_len,
            ..Default::default()
        };
        let mut pen_x = 0.0;
        'segments: for segment in &segments {
            let Some(font) = fonts.shaping_font(segment.font, scaled_size) else {
                continue;
            };
            let run = font.shape(segment.text(text));
            shaped.truncated |= run.truncated;
            for glyph in &run.glyphs {
                if shaped.glyphs.len() == MAX_GLYPHS_PER_TEXT {
                    shaped.truncated = true;
                    break 'segments;
                }
                shaped.glyphs.push(PositionedGlyph {
                    font: segment.font,
                    glyph_index: glyph.glyph_index,
                    cluster: segment.range.start + glyph.cluster as usize,
                    x: (pen_x + glyph.x_offset) / dpi,
                    y: -glyph.y_offset / dpi,
                    advance: glyph.x_advance / dpi,
                });
                pen_x += glyph.x_advance;
            }
        }
        shaped.width = pen_x / dpi;

        if shaped.truncated {
            log::debug!(
                "Text run of {input_len} bytes truncated to {} bytes, {} glyphs",
                text.len(),
                shaped.glyphs.len()
            );
        }
        self.shaped_cache.put(key, shaped.clone());
        shaped
    }

    /// Emit one quad per visible glyph of `shaped` into `batch`, with the
    /// baseline starting at `origin`. Returns the number of quads emitted.
    pub fn generate_vertices(
        &mut self,
        fonts: &FontManager,
        shaped: &ShapedText,
        origin: [f32; 2],
        color: [f32; 4],
        batch: &mut TextBatch,
    ) -> usize {
        let dpi = self.dpi_scale;
        let scaled_size = (shaped.size * dpi).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let mut emitted = 0;

        for glyph in &shaped.glyphs {
            if glyph.glyph_index == 0 {
                continue;
            }
            let Some(face) = fonts.face(glyph.font) else {
                continue;
            };
            let key = GlyphKey::new(face.id(), glyph.glyph_index, scaled_size);
            let rasterizer = &mut self.rasterizer;
            let entry = self.glyph_cache.get_or_insert_with(key, || {
                rasterizer.rasterize(face, glyph.glyph_index, scaled_size)
            });
            let Some(entry) = entry.copied() else {
                continue;
            };
            if entry.is_missing() {
                continue;
            }

            let x0 = origin[0] + glyph.x + entry.bearing[0] / dpi;
            let y0 = origin[1] + glyph.y - entry.bearing[1] / dpi;
            let x1 = x0 + entry.rect.width as f32 / dpi;
            let y1 = y0 + entry.rect.height as f32 / dpi;
            let uv = entry.region;
            let corner = |position: [f32; 2], uv: [f32; 2]| TextVertex {
                position,
                uv,
                color,
            };
            let quad = [
                corner([x0, y0], [uv.u_min, uv.v_min]),
                corner([x1, y0], [uv.u_max, uv.v_min]),
                corner([x0, y1], [uv.u_min, uv.v_max]),
                corner([x1, y1], [uv.u_max, uv.v_max]),
            ];
            if !batch.push_quad(entry.atlas, quad) {
                log::debug!("Text batch full at {} quads", batch.quad_count());
                break;
            }
            emitted += 1;
        }
        emitted
    }

    /// Shape and emit `text`. Returns the run's advance in logical pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        fonts: &mut FontManager,
        text: &str,
        chain: &FontFallbackChain,
        size: f32,
        origin: [f32; 2],
        color: [f32; 4],
        batch: &mut TextBatch,
    ) -> f32 {
        let shaped = self.shape_text(fonts, text, chain, size);
        self.generate_vertices(fonts, &shaped, origin, color, batch);
        shaped.width
    }

    /// Shaped advance of `text`, no vertices emitted.
    pub fn measure_text(
        &mut self,
        fonts: &mut FontManager,
        text: &str,
        chain: &FontFallbackChain,
        size: f32,
    ) -> f32 {
        self.shape_text(fonts, text, chain, size).width
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingRasterizer, SyntheticFont};

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    fn setup() -> (FontManager, FontFallbackChain) {
        let mut fonts = FontManager::new();
        let latin = fonts
            .load_font_from_memory(SyntheticFont::ascii(500).build(), "Latin")
            .unwrap();
        let han = fonts
            .load_font_from_memory(
                SyntheticFont::with_ranges(1000, &[(0x4E00, 0x4E10)]).build(),
                "Han",
            )
            .unwrap();
        (fonts, FontFallbackChain::new(vec![latin, han]))
    }

    fn counting_renderer(dpi: f32) -> TextRenderer<CountingRasterizer> {
        TextRenderer::with_rasterizer(GlyphCacheConfig::with_dpi_scale(dpi), CountingRasterizer::new())
    }

    #[test]
    fn test_shape_empty() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let shaped = renderer.shape_text(&mut fonts, "", &chain, 16.0);
        assert!(shaped.is_empty());
        assert_eq!(shaped.width, 0.0);

        let mut batch = TextBatch::new();
        assert_eq!(renderer.generate_vertices(&fonts, &shaped, [0.0, 0.0], WHITE, &mut batch), 0);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_shape_invalid_size() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        assert!(renderer.shape_text(&mut fonts, "abc", &chain, 0.0).is_empty());
        assert!(renderer.shape_text(&mut fonts, "abc", &chain, 900.0).is_empty());
    }

    #[test]
    fn test_shape_without_fonts() {
        let mut fonts = FontManager::new();
        let mut renderer = TextRenderer::new(1.0);
        let shaped = renderer.shape_text(&mut fonts, "abc", &FontFallbackChain::default(), 16.0);
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_shape_positions() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let shaped = renderer.shape_text(&mut fonts, "abc", &chain, 20.0);
        assert_eq!(shaped.width, 30.0);
        let xs: Vec<f32> = shaped.glyphs.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);
        assert_eq!(shaped.glyphs[2].cluster, 2);
        assert!(!shaped.truncated);
    }

    #[test]
    fn test_shape_uses_fallback_font() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let text = "a\u{4E00}b";
        let shaped = renderer.shape_text(&mut fonts, text, &chain, 20.0);
        assert_eq!(shaped.glyphs.len(), 3);
        assert_eq!(shaped.glyphs[1].font, chain.fonts()[1]);
        assert_eq!(shaped.glyphs[1].cluster, 1);
        assert_eq!(shaped.glyphs[2].cluster, 4);
        assert_eq!(shaped.glyphs[2].x, 30.0);
        assert_eq!(shaped.width, 40.0);
    }

    #[test]
    fn test_long_run_truncated() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let text = "m".repeat(2000);
        let shaped = renderer.shape_text(&mut fonts, &text, &chain, 10.0);
        assert_eq!(shaped.glyphs.len(), MAX_GLYPHS_PER_TEXT);
        assert!(shaped.truncated);

        let mut batch = TextBatch::new();
        let quads = renderer.generate_vertices(&fonts, &shaped, [0.0, 0.0], WHITE, &mut batch);
        assert_eq!(quads, MAX_GLYPHS_PER_TEXT);
    }

    #[test]
    fn test_truncated_across_segments() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let text = format!("{}{}", "a".repeat(1000), "\u{4E01}".repeat(100));
        let shaped = renderer.shape_text(&mut fonts, &text, &chain, 10.0);
        assert_eq!(shaped.glyphs.len(), MAX_GLYPHS_PER_TEXT);
        assert!(shaped.truncated);
    }

    #[test]
    fn test_truncate_to_boundary() {
        assert_eq!(truncate_to_boundary("abc", 8), "abc");
        assert_eq!(truncate_to_boundary("abc", 2), "ab");
        // 'é' is two bytes.
        assert_eq!(truncate_to_boundary("ééé", 3), "é");
        let long = "é".repeat(MAX_TEXT_LENGTH);
        assert_eq!(truncate_to_boundary(&long, MAX_TEXT_LENGTH).len(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_shaped_cache_reused() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let first = renderer.shape_text(&mut fonts, "cache", &chain, 14.0);
        let second = renderer.shape_text(&mut fonts, "cache", &chain, 14.1);
        assert_eq!(first, second);
        assert_eq!(renderer.shaped_cache_len(), 1);
        renderer.shape_text(&mut fonts, "cache", &chain, 15.0);
        assert_eq!(renderer.shaped_cache_len(), 2);
    }

    #[test]
    fn test_shaped_cache_follows_default_font() {
        let (mut fonts, chain) = setup();
        let han = chain.fonts()[1];
        let empty = FontFallbackChain::default();
        let mut renderer = TextRenderer::new(1.0);

        let first = renderer.shape_text(&mut fonts, "abc", &empty, 20.0);
        assert_eq!(first.glyphs[0].font, chain.fonts()[0]);
        assert_eq!(first.width, 30.0);

        assert!(fonts.set_default_font(han));
        let second = renderer.shape_text(&mut fonts, "abc", &empty, 20.0);
        assert_eq!(second.glyphs[0].font, han);
        assert_eq!(second.width, 60.0);
        assert_eq!(renderer.shaped_cache_len(), 2);
    }

    #[test]
    fn test_input_cut_marks_truncated() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let text = "\u{4E01}".repeat(MAX_TEXT_LENGTH / 3 + 10);
        let shaped = renderer.shape_text(&mut fonts, &text, &chain, 10.0);
        assert!(shaped.truncated);
        assert!(shaped.glyphs.iter().all(|g| g.cluster < MAX_TEXT_LENGTH));

        let short = renderer.shape_text(&mut fonts, "abc", &chain, 10.0);
        assert!(!short.truncated);
    }

    #[test]
    fn test_generate_skips_missing_glyphs() {
        let (mut fonts, chain) = setup();
        let mut renderer = counting_renderer(1.0);
        let mut batch = TextBatch::new();
        let width = renderer.draw_text(&mut fonts, "ab c", &chain, 20.0, [0.0, 0.0], WHITE, &mut batch);
        // Space is unmapped in both fonts and emits nothing.
        assert_eq!(batch.quad_count(), 3);
        assert_eq!(batch.vertices().len(), 12);
        assert_eq!(batch.draws().len(), 1);
        assert!(width >= 30.0);
    }

    #[test]
    fn test_repeat_draw_hits_cache() {
        let (mut fonts, chain) = setup();
        let mut renderer = counting_renderer(1.0);
        let mut batch = TextBatch::new();
        renderer.draw_text(&mut fonts, "hello", &chain, 18.0, [0.0, 0.0], WHITE, &mut batch);
        // h, e, l, o
        assert_eq!(renderer.rasterizer().calls(), 4);

        renderer.begin_frame();
        batch.clear();
        renderer.draw_text(&mut fonts, "hello", &chain, 18.0, [5.0, 5.0], WHITE, &mut batch);
        assert_eq!(renderer.rasterizer().calls(), 4);
        assert_eq!(batch.quad_count(), 5);
    }

    #[test]
    fn test_quad_placement() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let mut batch = TextBatch::new();
        renderer.draw_text(&mut fonts, "H", &chain, 20.0, [100.0, 50.0], [1.0, 0.0, 0.0, 1.0], &mut batch);

        let face = fonts.face(chain.fonts()[0]).unwrap();
        let key = GlyphKey::new(face.id(), face.glyph_index('H'), 20.0);
        let entry = *renderer.glyph_cache_mut().get(&key).unwrap();

        let v = batch.vertices();
        assert_eq!(v.len(), 4);
        assert_eq!(v[0].position, [100.0 + entry.bearing[0], 50.0 - entry.bearing[1]]);
        assert_eq!(v[3].position[0] - v[0].position[0], entry.rect.width as f32);
        assert_eq!(v[3].position[1] - v[0].position[1], entry.rect.height as f32);
        assert_eq!(v[1].position[1], v[0].position[1]);
        assert_eq!(v[2].position[0], v[0].position[0]);
        assert_eq!(v[0].uv, [entry.region.u_min, entry.region.v_min]);
        assert_eq!(v[3].uv, [entry.region.u_max, entry.region.v_max]);
        assert!(v.iter().all(|vx| vx.color == [1.0, 0.0, 0.0, 1.0]));
        // Glyph top sits above the baseline.
        assert!(v[0].position[1] < 50.0);
    }

    #[test]
    fn test_dpi_scaling_keeps_logical_layout() {
        let (mut fonts, chain) = setup();
        let mut low = TextRenderer::new(1.0);
        let mut high = TextRenderer::new(2.0);
        let a = low.shape_text(&mut fonts, "abc", &chain, 20.0);
        let b = high.shape_text(&mut fonts, "abc", &chain, 20.0);
        assert_eq!(a.width, b.width);
        assert_eq!(high.dpi_scale(), 2.0);

        let mut batch = TextBatch::new();
        high.generate_vertices(&fonts, &b, [0.0, 0.0], WHITE, &mut batch);
        let face = fonts.face(chain.fonts()[0]).unwrap();
        let key = GlyphKey::new(face.id(), face.glyph_index('a'), 40.0);
        let entry = *high.glyph_cache_mut().get(&key).unwrap();
        let v = batch.vertices();
        assert_eq!(v[1].position[0] - v[0].position[0], entry.rect.width as f32 / 2.0);
    }

    #[test]
    fn test_batch_limit() {
        let (mut fonts, chain) = setup();
        let mut renderer = TextRenderer::new(1.0);
        let mut batch = TextBatch::with_max_quads(2);
        let shaped = renderer.shape_text(&mut fonts, "abcd", &chain, 16.0);
        let emitted = renderer.generate_vertices(&fonts, &shaped, [0.0, 0.0], WHITE, &mut batch);
        assert_eq!(emitted, 2);
        assert!(batch.is_full());
        assert!(!batch.push_quad(0, [TextVertex::default(); 4]));
        assert_eq!(batch.quad_count(), 2);
    }

    #[test]
    fn test_batch_groups_by_atlas() {
        let mut batch = TextBatch::new();
        let quad = [TextVertex::default(); 4];
        assert!(batch.push_quad(0, quad));
        assert!(batch.push_quad(0, quad));
        assert!(batch.push_quad(1, quad));
        assert!(batch.push_quad(0, quad));
        let draws = batch.draws();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0], AtlasDraw { atlas: 0, first_vertex: 0, vertex_count: 8 });
        assert_eq!(draws[1].first_vertex, 8);
        assert_eq!(draws[2].quad_count(), 1);
        assert_eq!(batch.max_quads(), MAX_COMMANDS_PER_LIST);
    }

    #[test]
    fn test_vertex_is_pod() {
        let vertices = [TextVertex::default(); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<TextVertex>());
        assert_eq!(std::mem::size_of::<TextVertex>(), 32);
    }
}

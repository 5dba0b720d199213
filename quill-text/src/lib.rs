//! # quill-text
//!
//! Text pipeline for the Quill toolkit. Turns Unicode text plus a font size
//! into shaped, rasterized glyphs packed into atlas pages, and emits quads
//! ready for GPU upload.
//!
//! ## Architecture
//!
//! ```text
//! FontManager ── FontEntry { FontFile, FontFace, FontCache }
//!     │                                   │
//!     ▼                                   ▼
//! TextRenderer::shape_text ──► ShapingFont::shape (rustybuzz)
//!     │
//!     ▼
//! TextRenderer::generate_vertices ──► GlyphCache ──► Rasterizer (swash)
//!     │                                   │
//!     ▼                                   ▼
//! TextBatch { TextVertex, AtlasDraw }   GlyphAtlas pages ──► GPU upload
//! ```
//!
//! - **`font`** — font bytes, parsed faces, metrics.
//! - **`font_cache`** — per-face LRU of size-bound shaping handles.
//! - **`glyph_cache`** / **`atlas`** — rasterized glyphs on shelf-packed pages.
//! - **`manager`** / **`database`** — loaded fonts, fallback, system discovery.
//! - **`renderer`** — shaping, glyph lookup and vertex generation per run.
//!
//! Every cache is owned by the context that creates it; nothing here is
//! global.

pub mod atlas;
pub mod config;
pub mod database;
pub mod error;
pub mod font;
pub mod font_cache;
pub mod glyph_cache;
pub mod manager;
pub mod raster;
pub mod renderer;
pub mod shaping;
pub mod text_utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for ergonomic use.
pub use atlas::{AtlasRect, AtlasRegion, GlyphAtlas};
pub use config::GlyphCacheConfig;
pub use database::{FontDatabase, FontDescriptor, FontMatch, FontStretch, FontStyle, GenericFamily};
pub use error::FontError;
pub use font::{FaceId, FontFace, FontFile, FontMetrics, GlyphMetrics};
pub use font_cache::FontCache;
pub use glyph_cache::{GlyphCache, GlyphCacheStats, GlyphEntry, GlyphKey};
pub use manager::{FontEntry, FontFallbackChain, FontHandle, FontManager};
pub use raster::{GlyphBitmap, Rasterizer, SwashRasterizer};
pub use renderer::{AtlasDraw, PositionedGlyph, ShapedText, TextBatch, TextRenderer, TextVertex};
pub use shaping::{GlyphRun, ShapedGlyph, ShapingFont};

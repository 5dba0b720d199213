//! # quill-render
//!
//! `wgpu` backend for quill-text: mirrors glyph atlas pages as GPU
//! textures and draws `TextBatch` quads.
//!
//! ```text
//!  TextRenderer::draw_text ──► TextBatch      GlyphCache pages
//!                                  │                 │
//!                                  ▼                 ▼
//!                       TextPipeline::prepare   AtlasTextures::sync
//!                                  │          (dirty rects only)
//!                                  ▼
//!                       one indexed draw per AtlasDraw
//! ```
//!
//! - [`context`]: device, queue and surface setup
//! - [`vertex`]: vertex layout, quad indices, viewport uniform
//! - [`atlas_textures`]: per-page `R8Unorm` textures
//! - [`pipelines`]: the text render pipeline
//! - [`renderer`]: per-frame orchestration

pub mod atlas_textures;
pub mod context;
pub mod pipelines;
pub mod renderer;
pub mod vertex;

pub use atlas_textures::{AtlasTextures, UploadStats};
pub use context::{GpuContext, GpuError};
pub use pipelines::TextPipeline;
pub use renderer::{FrameStats, RenderError, TextGpuRenderer};
pub use vertex::{quad_indices, text_vertex_layout, ViewportUniform, QUAD_INDICES};

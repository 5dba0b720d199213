//! Per-frame orchestration: atlas sync, batch upload, one render pass.

use quill_text::{GlyphCache, TextBatch};
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView, TextureViewDescriptor,
};

use crate::atlas_textures::{AtlasTextures, UploadStats};
use crate::context::GpuContext;
use crate::pipelines::TextPipeline;
use crate::vertex::ViewportUniform;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No surface configured (headless mode)")]
    NoSurface,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub quads: usize,
    pub draw_calls: usize,
    pub upload: UploadStats,
}

/// GPU side of text drawing.
///
/// ```ignore
/// renderer.draw_text(&mut fonts, "Hello", &chain, 14.0, [8.0, 20.0], white, &mut batch);
/// let stats = gpu_text.prepare(&gpu, renderer.glyph_cache_mut(), &batch, &viewport);
/// gpu_text.render_to_surface(&gpu)?;
/// batch.clear();
/// ```
pub struct TextGpuRenderer {
    pipeline: TextPipeline,
    textures: AtlasTextures,
    clear_color: Color,
    prepared: FrameStats,
}

impl TextGpuRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            pipeline: TextPipeline::new(&gpu.device, gpu.surface_format),
            textures: AtlasTextures::new(&gpu.device),
            clear_color: Color {
                r: 0.12,
                g: 0.12,
                b: 0.13,
                a: 1.0,
            },
            prepared: FrameStats::default(),
        }
    }

    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Upload dirty atlas regions, the batch and the viewport. Call once per
    /// frame before rendering.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        cache: &mut GlyphCache,
        batch: &TextBatch,
        viewport: &ViewportUniform,
    ) -> FrameStats {
        let upload = self.textures.sync(&gpu.device, &gpu.queue, cache);
        let quads = self
            .pipeline
            .prepare(&gpu.device, &gpu.queue, batch, &mut self.textures);
        self.pipeline.upload_viewport(&gpu.queue, viewport);

        self.prepared = FrameStats {
            quads,
            draw_calls: self.pipeline.draw_count(),
            upload,
        };
        self.prepared
    }

    pub fn render_to_surface(&self, gpu: &GpuContext) -> Result<FrameStats, RenderError> {
        let surface = gpu.surface.as_ref().ok_or(RenderError::NoSurface)?;
        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());
        self.encode(gpu, &view, "quill_frame");
        output.present();
        Ok(self.prepared)
    }

    /// Render into an off-screen target.
    pub fn render_to_texture(&self, gpu: &GpuContext, target: &TextureView) -> FrameStats {
        self.encode(gpu, target, "quill_offscreen");
        self.prepared
    }

    pub fn textures(&self) -> &AtlasTextures {
        &self.textures
    }

    fn encode(&self, gpu: &GpuContext, view: &TextureView, label: &str) {
        let mut encoder = gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.pipeline.draw(&mut pass, &self.textures);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_text::testing::SyntheticFont;
    use quill_text::{FontFallbackChain, FontManager, TextRenderer};

    #[test]
    fn test_headless_frame() {
        let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) else {
            return;
        };
        let mut fonts = FontManager::new();
        let latin = fonts
            .load_font_from_memory(SyntheticFont::ascii(600).build(), "Latin")
            .unwrap();
        let chain = FontFallbackChain::single(latin);
        let mut text = TextRenderer::new(1.0);
        let mut batch = TextBatch::new();
        text.draw_text(&mut fonts, "frame", &chain, 14.0, [4.0, 16.0], [1.0; 4], &mut batch);

        let mut gpu_text = TextGpuRenderer::new(&gpu);
        let viewport = ViewportUniform::pixels(256.0, 64.0);
        let stats = gpu_text.prepare(&gpu, text.glyph_cache_mut(), &batch, &viewport);
        assert_eq!(stats.quads, 5);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.upload.pages_created, 1);
        assert!(matches!(gpu_text.render_to_surface(&gpu), Err(RenderError::NoSurface)));

        let target = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test_target"),
            size: wgpu::Extent3d {
                width: 256,
                height: 64,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&TextureViewDescriptor::default());
        assert_eq!(gpu_text.render_to_texture(&gpu, &view), stats);

        // Nothing new rasterized, nothing re-uploaded.
        let again = gpu_text.prepare(&gpu, text.glyph_cache_mut(), &batch, &viewport);
        assert_eq!(again.upload, UploadStats::default());
    }
}

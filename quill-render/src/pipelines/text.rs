//! Text render pipeline: indexed glyph quads sampling atlas pages.
//!
//! A `TextBatch` uploads as one vertex buffer. Each `AtlasDraw` range
//! becomes one indexed draw with that page's bind group.

use quill_text::config::MAX_COMMANDS_PER_LIST;
use quill_text::{AtlasDraw, TextBatch, TextVertex};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, BlendState, Buffer, BufferBindingType, BufferDescriptor,
    BufferUsages, ColorTargetState, ColorWrites, Device, FragmentState, FrontFace, IndexFormat,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode,
    PrimitiveState, PrimitiveTopology, Queue, RenderPass, RenderPipeline,
    RenderPipelineDescriptor, SamplerBindingType, ShaderModuleDescriptor, ShaderStages,
    TextureFormat, TextureSampleType, TextureViewDimension, VertexState,
};

use crate::atlas_textures::AtlasTextures;
use crate::vertex::{quad_indices, text_vertex_layout, ViewportUniform, QUAD_INDICES};

pub struct TextPipeline {
    pipeline: RenderPipeline,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    viewport_buffer: Buffer,
    viewport_bind_group: BindGroup,
    atlas_bgl: BindGroupLayout,
    max_quads: usize,
    draws: Vec<AtlasDraw>,
}

impl TextPipeline {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        Self::with_max_quads(device, surface_format, MAX_COMMANDS_PER_LIST)
    }

    /// Create the pipeline with buffers sized for `max_quads` quads.
    pub fn with_max_quads(device: &Device, surface_format: TextureFormat, max_quads: usize) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("quill_text_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/text.wgsl").into()),
        });

        let viewport_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("quill_viewport_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let atlas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("quill_atlas_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("quill_text_pipeline_layout"),
            bind_group_layouts: &[&viewport_bgl, &atlas_bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("quill_text_pipeline"),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[text_vertex_layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_text_vb"),
            size: (max_quads * 4 * std::mem::size_of::<TextVertex>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Indices never change, so they are written once here.
        let indices = quad_indices(max_quads);
        let index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_text_ib"),
            size: (indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: BufferUsages::INDEX,
            mapped_at_creation: true,
        });
        index_buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::cast_slice(&indices));
        index_buffer.unmap();

        let viewport_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_viewport_ub"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("quill_viewport_bg"),
            layout: &viewport_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            viewport_buffer,
            viewport_bind_group,
            atlas_bgl,
            max_quads,
            draws: Vec::new(),
        }
    }

    pub fn atlas_layout(&self) -> &BindGroupLayout {
        &self.atlas_bgl
    }

    pub fn upload_viewport(&self, queue: &Queue, viewport: &ViewportUniform) {
        queue.write_buffer(&self.viewport_buffer, 0, bytemuck::bytes_of(viewport));
    }

    /// Upload `batch` and remember its draw ranges. Quads beyond the
    /// pipeline's capacity are dropped. Returns the number of quads kept.
    pub fn prepare(
        &mut self,
        device: &Device,
        queue: &Queue,
        batch: &TextBatch,
        textures: &mut AtlasTextures,
    ) -> usize {
        self.draws = clip_draws(batch.draws(), self.max_quads);
        let quads = self.quad_count();
        if quads < batch.quad_count() {
            log::warn!(
                "Text batch of {} quads exceeds pipeline capacity {}",
                batch.quad_count(),
                self.max_quads
            );
        }
        if quads == 0 {
            return 0;
        }

        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&batch.vertices()[..quads * 4]),
        );

        self.draws.retain(|draw| {
            let bound = textures.bind_group(device, &self.atlas_bgl, draw.atlas).is_some();
            if !bound {
                log::warn!("No atlas texture for page {}; call AtlasTextures::sync first", draw.atlas);
            }
            bound
        });
        self.quad_count()
    }

    /// Record one indexed draw per atlas range.
    pub fn draw<'a>(&'a self, pass: &mut RenderPass<'a>, textures: &'a AtlasTextures) {
        if self.draws.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.viewport_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), IndexFormat::Uint32);

        for draw in &self.draws {
            let Some(bind_group) = textures.cached_bind_group(draw.atlas) else {
                continue;
            };
            pass.set_bind_group(1, bind_group, &[]);
            pass.draw_indexed(index_range(draw), 0, 0..1);
        }
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn quad_count(&self) -> usize {
        self.draws.iter().map(|d| d.quad_count() as usize).sum()
    }
}

/// Index buffer range covering the quads of `draw`.
fn index_range(draw: &AtlasDraw) -> std::ops::Range<u32> {
    let per_quad = QUAD_INDICES.len() as u32;
    let start = draw.first_vertex / 4 * per_quad;
    start..start + draw.quad_count() * per_quad
}

/// Cut draw ranges so no more than `max_quads` quads remain.
fn clip_draws(draws: &[AtlasDraw], max_quads: usize) -> Vec<AtlasDraw> {
    let max_vertices = (max_quads * 4) as u32;
    draws
        .iter()
        .filter(|draw| draw.first_vertex < max_vertices)
        .map(|draw| AtlasDraw {
            vertex_count: draw.vertex_count.min(max_vertices - draw.first_vertex),
            ..*draw
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(atlas: usize, first_vertex: u32, quads: u32) -> AtlasDraw {
        AtlasDraw {
            atlas,
            first_vertex,
            vertex_count: quads * 4,
        }
    }

    #[test]
    fn test_index_range() {
        assert_eq!(index_range(&draw(0, 0, 2)), 0..12);
        assert_eq!(index_range(&draw(1, 8, 3)), 12..30);
    }

    #[test]
    fn test_clip_draws_respects_capacity() {
        let draws = [draw(0, 0, 3), draw(1, 12, 3), draw(0, 24, 3)];
        let clipped = clip_draws(&draws, 5);
        assert_eq!(clipped, vec![draw(0, 0, 3), draw(1, 12, 2)]);
        assert_eq!(clip_draws(&draws, 100).len(), 3);
    }

    #[test]
    fn test_prepare_headless() {
        use quill_text::testing::SyntheticFont;
        use quill_text::{FontFallbackChain, FontManager, TextRenderer};

        let Ok(ctx) = pollster::block_on(crate::GpuContext::new_headless()) else {
            return;
        };
        let mut fonts = FontManager::new();
        let handle = fonts
            .load_font_from_memory(SyntheticFont::ascii(600).build(), "Latin")
            .unwrap();
        let chain = FontFallbackChain::single(handle);
        let mut renderer = TextRenderer::new(1.0);
        let mut batch = TextBatch::new();
        renderer.draw_text(&mut fonts, "GPU", &chain, 16.0, [0.0, 20.0], [1.0; 4], &mut batch);

        let mut textures = AtlasTextures::new(&ctx.device);
        textures.sync(&ctx.device, &ctx.queue, renderer.glyph_cache_mut());
        let mut pipeline = TextPipeline::with_max_quads(&ctx.device, ctx.surface_format, 64);
        assert_eq!(pipeline.prepare(&ctx.device, &ctx.queue, &batch, &mut textures), 3);
        assert_eq!(pipeline.draw_count(), 1);
    }
}

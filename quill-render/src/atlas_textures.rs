//! GPU mirrors of the glyph cache's atlas pages.
//!
//! One `R8Unorm` texture per page. `sync` creates textures for new pages
//! and uploads only the dirty rectangle of pages that already exist.

use quill_text::{AtlasRect, GlyphAtlas, GlyphCache};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindingResource, Device, Extent3d, FilterMode, Origin3d, Queue, Sampler, SamplerDescriptor,
    TexelCopyBufferLayout, TexelCopyTextureInfo, Texture, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView,
};

pub const ATLAS_FORMAT: TextureFormat = TextureFormat::R8Unorm;

struct AtlasTexture {
    texture: Texture,
    view: TextureView,
    bind_group: Option<BindGroup>,
    width: u32,
    height: u32,
}

/// What one `sync` call sent to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub pages_created: usize,
    pub regions_uploaded: usize,
    pub bytes_uploaded: u64,
}

pub struct AtlasTextures {
    pages: Vec<AtlasTexture>,
    sampler: Sampler,
}

impl AtlasTextures {
    pub fn new(device: &Device) -> Self {
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("quill_atlas_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        Self {
            pages: Vec::new(),
            sampler,
        }
    }

    /// Bring every page texture up to date with `cache`. Call once per frame
    /// after all text has been drawn.
    pub fn sync(&mut self, device: &Device, queue: &Queue, cache: &mut GlyphCache) -> UploadStats {
        let mut stats = UploadStats::default();

        for index in 0..cache.atlas_count() {
            let dirty = cache.take_dirty(index);
            let Some(atlas) = cache.atlas(index) else {
                break;
            };

            let stale = self
                .pages
                .get(index)
                .is_none_or(|page| page.width != atlas.width() || page.height != atlas.height());
            if stale {
                let page = create_page(device, index, atlas);
                if index < self.pages.len() {
                    self.pages[index] = page;
                } else {
                    self.pages.push(page);
                }
                stats.pages_created += 1;
                let full = AtlasRect {
                    x: 0,
                    y: 0,
                    width: atlas.width(),
                    height: atlas.height(),
                };
                stats.bytes_uploaded += write_region(queue, &self.pages[index].texture, atlas, &full);
                stats.regions_uploaded += 1;
                log::debug!("Created atlas texture {index} ({}x{})", atlas.width(), atlas.height());
                continue;
            }

            if let Some(rect) = dirty {
                stats.bytes_uploaded += write_region(queue, &self.pages[index].texture, atlas, &rect);
                stats.regions_uploaded += 1;
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn view(&self, index: usize) -> Option<&TextureView> {
        self.pages.get(index).map(|page| &page.view)
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Texture and sampler bind group for page `index`, built on first use.
    pub fn bind_group(
        &mut self,
        device: &Device,
        layout: &BindGroupLayout,
        index: usize,
    ) -> Option<&BindGroup> {
        let sampler = &self.sampler;
        let page = self.pages.get_mut(index)?;
        if page.bind_group.is_none() {
            page.bind_group = Some(device.create_bind_group(&BindGroupDescriptor {
                label: Some("quill_atlas_bg"),
                layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: BindingResource::TextureView(&page.view),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: BindingResource::Sampler(sampler),
                    },
                ],
            }));
        }
        page.bind_group.as_ref()
    }

    /// Bind group for page `index` if `bind_group` already built it.
    pub fn cached_bind_group(&self, index: usize) -> Option<&BindGroup> {
        self.pages.get(index)?.bind_group.as_ref()
    }
}

fn create_page(device: &Device, index: usize, atlas: &GlyphAtlas) -> AtlasTexture {
    let label = format!("quill_atlas_{index}");
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(&label),
        size: Extent3d {
            width: atlas.width(),
            height: atlas.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: ATLAS_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    AtlasTexture {
        texture,
        view,
        bind_group: None,
        width: atlas.width(),
        height: atlas.height(),
    }
}

/// Byte offset of `rect`'s first pixel in a tightly packed one-byte page
/// of `page_width` columns.
pub fn region_offset(rect: &AtlasRect, page_width: u32) -> u64 {
    rect.y as u64 * page_width as u64 + rect.x as u64
}

fn write_region(queue: &Queue, texture: &Texture, atlas: &GlyphAtlas, rect: &AtlasRect) -> u64 {
    if rect.is_empty() {
        return 0;
    }
    queue.write_texture(
        TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: Origin3d {
                x: rect.x,
                y: rect.y,
                z: 0,
            },
            aspect: TextureAspect::All,
        },
        atlas.pixels(),
        TexelCopyBufferLayout {
            offset: region_offset(rect, atlas.width()),
            bytes_per_row: Some(atlas.width()),
            rows_per_image: Some(rect.height),
        },
        Extent3d {
            width: rect.width,
            height: rect.height,
            depth_or_array_layers: 1,
        },
    );
    rect.width as u64 * rect.height as u64
}

//! GPU context: owns the `wgpu` device, queue and optional surface.
//!
//! `GpuContext::new_headless` needs no window and backs tests and
//! benchmarks. `GpuContext::new_with_surface` attaches to a window handle.

use quill_text::GlyphCacheConfig;
use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, PowerPreference, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, TextureFormat, TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Atlas page {width}x{height} exceeds the device texture limit {limit}")]
    AtlasTooLarge { width: u32, height: u32, limit: u32 },
}

pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    /// `None` when headless.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
}

impl GpuContext {
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let adapter = request_adapter(&instance, None).await?;
        let (device, queue) = request_device(&adapter, "quill-headless").await?;

        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            surface_format: TextureFormat::Bgra8UnormSrgb,
        })
    }

    /// Create a context presenting to `window`, which must outlive it.
    pub async fn new_with_surface<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;
        let adapter = request_adapter(&instance, Some(&surface)).await?;
        let (device, queue) = request_device(&adapter, "quill-windowed").await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| GpuError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        log::info!("GPU surface configured: {}x{} {:?}", config.width, config.height, format);

        Ok(Self {
            device,
            queue,
            adapter,
            surface: Some(surface),
            surface_config: Some(config),
            surface_format: format,
        })
    }

    /// Resize the surface. Zero sizes and headless contexts are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let (Some(config), Some(surface)) = (&mut self.surface_config, &self.surface) {
            config.width = width;
            config.height = height;
            surface.configure(&self.device, config);
        }
    }

    /// `(0, 0)` when headless.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_config
            .as_ref()
            .map(|c| (c.width, c.height))
            .unwrap_or((0, 0))
    }

    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Check that glyph atlas pages built from `config` fit on this device.
    pub fn check_atlas_config(&self, config: &GlyphCacheConfig) -> Result<(), GpuError> {
        check_atlas_against_limit(config, self.max_texture_size())
    }
}

fn check_atlas_against_limit(config: &GlyphCacheConfig, limit: u32) -> Result<(), GpuError> {
    let (width, height) = (config.scaled_width(), config.scaled_height());
    if width > limit || height > limit {
        return Err(GpuError::AtlasTooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

async fn request_adapter(
    instance: &Instance,
    surface: Option<&Surface<'static>>,
) -> Result<Adapter, GpuError> {
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;
    log::info!("GPU adapter: {}", adapter.get_info().name);
    Ok(adapter)
}

async fn request_device(adapter: &Adapter, label: &str) -> Result<(Device, Queue), GpuError> {
    let (device, queue) = adapter
        .request_device(
            &DeviceDescriptor {
                label: Some(label),
                ..Default::default()
            },
            None,
        )
        .await?;
    Ok((device, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlas_limit_check() {
        let config = GlyphCacheConfig::default();
        assert!(check_atlas_against_limit(&config, 8192).is_ok());

        let hidpi = GlyphCacheConfig::with_dpi_scale(4.0);
        match check_atlas_against_limit(&hidpi, 2048) {
            Err(GpuError::AtlasTooLarge { limit, .. }) => assert_eq!(limit, 2048),
            other => panic!("expected AtlasTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_surface_size_headless() {
        // No adapter in CI is fine.
        if let Ok(ctx) = pollster::block_on(GpuContext::new_headless()) {
            assert_eq!(ctx.surface_size(), (0, 0));
            assert!(ctx.surface.is_none());
            assert!(ctx.max_texture_size() >= 2048);
        }
    }
}

//! wgpu Context
//!
//! The [`WgpuContext`] holds core GPU handles: device, queue, and the probed
//! device capabilities the render-target fallback table consults. The demo
//! runs headless, so there is no surface here; presentation is an external
//! collaborator's concern.

use crate::errors::{LustreError, Result};
use crate::renderer::settings::RendererSettings;

/// Capabilities relevant to render-target format resolution.
///
/// Probed once at init. Kept as plain booleans so the fallback logic is
/// testable with synthetic capability sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    /// `Rgba16Float` usable as a render attachment.
    pub half_float_renderable: bool,
    /// `Rgba16Float` usable with a filtering sampler.
    pub half_float_filterable: bool,
}

impl DeviceCaps {
    /// Everything supported — what a modern adapter reports.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            half_float_renderable: true,
            half_float_filterable: true,
        }
    }

    fn probe(adapter: &wgpu::Adapter) -> Self {
        let features = adapter.get_texture_format_features(wgpu::TextureFormat::Rgba16Float);
        Self {
            half_float_renderable: features
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            half_float_filterable: features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE),
        }
    }
}

/// Core wgpu context holding GPU handles.
pub struct WgpuContext {
    /// The wgpu device for GPU operations
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,
    /// Probed capability set
    pub caps: DeviceCaps,
    /// Depth buffer format
    pub depth_format: wgpu::TextureFormat,
}

impl WgpuContext {
    pub async fn new(settings: &RendererSettings) -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| LustreError::AdapterRequestFailed(e.to_string()))?;

        let caps = DeviceCaps::probe(&adapter);
        log::debug!("adapter caps: {caps:?}");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: settings.required_features,
                required_limits: settings.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            caps,
            depth_format: settings.depth_format,
        })
    }

    /// Blocking constructor for non-async callers.
    pub fn new_blocking(settings: &RendererSettings) -> Result<Self> {
        pollster::block_on(Self::new(settings))
    }

    /// Creates a depth texture view for the given extent.
    #[must_use]
    pub fn create_depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

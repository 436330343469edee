//! Render-Target Pool
//!
//! Owns the offscreen color buffers used as intermediate capture surfaces.
//! A target's resolution, filtering, and format are fixed at acquisition and
//! never change for the lifetime of the session.
//!
//! # Format fallback
//!
//! If the device cannot honor the requested configuration, the pool
//! substitutes the nearest supported one — explicitly, not by letting the
//! driver decide. The table:
//!
//! | requested precision | device support                 | resolved format |
//! |---------------------|--------------------------------|-----------------|
//! | half-float          | `Rgba16Float` renderable       | `Rgba16Float`   |
//! | half-float          | not renderable                 | `Rgba8Unorm`    |
//! | byte                | always                         | `Rgba8Unorm`    |
//!
//! | requested filter | device support                | resolved filter |
//! |------------------|-------------------------------|-----------------|
//! | linear           | resolved format filterable    | linear          |
//! | linear           | not filterable                | nearest         |
//! | nearest          | always                        | nearest         |
//!
//! Every substitution is logged at warn level. Wrap mode is always
//! clamp-to-edge.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{LustreError, Result};
use crate::renderer::context::DeviceCaps;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Requested texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    Nearest,
    Linear,
}

/// Requested texel precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPrecision {
    Byte,
    HalfFloat,
}

/// Acquisition configuration. Wrap is always clamp-to-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetConfig {
    pub filter: TargetFilter,
    pub precision: TargetPrecision,
    pub mipmapped: bool,
}

impl TargetConfig {
    /// Shadow color target: nearest, byte, no mips.
    pub const SHADOW: Self = Self {
        filter: TargetFilter::Nearest,
        precision: TargetPrecision::Byte,
        mipmapped: false,
    };

    /// Transmission capture target: linear, half-float, mipmapped.
    pub const TRANSMISSION: Self = Self {
        filter: TargetFilter::Linear,
        precision: TargetPrecision::HalfFloat,
        mipmapped: true,
    };

    /// Scene color / post-processing intermediates: linear, half-float.
    pub const SCENE: Self = Self {
        filter: TargetFilter::Linear,
        precision: TargetPrecision::HalfFloat,
        mipmapped: false,
    };
}

/// Device-independent resolution of a target request against a capability
/// set. Pure; the fallback table lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub filter: TargetFilter,
    pub mip_level_count: u32,
}

impl TargetSpec {
    #[must_use]
    pub fn resolve(width: u32, height: u32, config: TargetConfig, caps: DeviceCaps) -> Self {
        let format = match config.precision {
            TargetPrecision::HalfFloat if caps.half_float_renderable => {
                wgpu::TextureFormat::Rgba16Float
            }
            TargetPrecision::HalfFloat => {
                log::warn!(
                    "half-float render target unsupported; falling back to Rgba8Unorm"
                );
                wgpu::TextureFormat::Rgba8Unorm
            }
            TargetPrecision::Byte => wgpu::TextureFormat::Rgba8Unorm,
        };

        let filterable =
            format != wgpu::TextureFormat::Rgba16Float || caps.half_float_filterable;
        let filter = match config.filter {
            TargetFilter::Linear if filterable => TargetFilter::Linear,
            TargetFilter::Linear => {
                log::warn!("linear filtering unsupported for {format:?}; using nearest");
                TargetFilter::Nearest
            }
            TargetFilter::Nearest => TargetFilter::Nearest,
        };

        let mip_level_count = if config.mipmapped {
            full_mip_count(width, height)
        } else {
            1
        };

        Self {
            width,
            height,
            format,
            filter,
            mip_level_count,
        }
    }
}

/// Number of mip levels for a full chain.
#[must_use]
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// An offscreen 2D color buffer with fixed resolution and format.
///
/// Exclusively owned by the component that acquired it. There is no resize;
/// a new size means a new target.
#[derive(Debug)]
pub struct RenderTarget {
    id: u64,
    label: &'static str,
    spec: TargetSpec,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl RenderTarget {
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    #[must_use]
    pub fn spec(&self) -> TargetSpec {
        self.spec
    }

    /// Reported resolution — exactly the requested one, always.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.spec.width, self.spec.height)
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Full-chain view (all mip levels).
    #[inline]
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Single-level view of mip 0, for use as a render attachment on
    /// mipmapped targets.
    #[must_use]
    pub fn attachment_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(self.label),
            base_mip_level: 0,
            mip_level_count: Some(1),
            ..Default::default()
        })
    }

    #[inline]
    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Allocates fixed-resolution offscreen targets.
#[derive(Debug, Default)]
pub struct RenderTargetPool {
    acquired: u32,
}

impl RenderTargetPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a new target. The resolved spec follows the module-level
    /// fallback table; allocation failure is fatal (the session cannot run
    /// without its fixed target set).
    pub fn acquire(
        &mut self,
        device: &wgpu::Device,
        caps: DeviceCaps,
        label: &'static str,
        width: u32,
        height: u32,
        config: TargetConfig,
    ) -> Result<RenderTarget> {
        if width == 0 || height == 0 {
            return Err(LustreError::TargetAllocation { label, width, height });
        }

        let spec = TargetSpec::resolve(width, height, config, caps);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: spec.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let wgpu_filter = match spec.filter {
            TargetFilter::Linear => wgpu::FilterMode::Linear,
            TargetFilter::Nearest => wgpu::FilterMode::Nearest,
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu_filter,
            min_filter: wgpu_filter,
            mipmap_filter: if spec.mip_level_count > 1 {
                wgpu::MipmapFilterMode::Linear
            } else {
                wgpu::MipmapFilterMode::Nearest
            },
            ..Default::default()
        });

        self.acquired += 1;

        Ok(RenderTarget {
            id: NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed),
            label,
            spec,
            texture,
            view,
            sampler,
        })
    }

    /// Number of targets handed out over the session.
    #[inline]
    #[must_use]
    pub fn acquired_count(&self) -> u32 {
        self.acquired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_float_falls_back_to_byte_when_not_renderable() {
        let caps = DeviceCaps {
            half_float_renderable: false,
            half_float_filterable: false,
        };
        let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, caps);
        assert_eq!(spec.format, wgpu::TextureFormat::Rgba8Unorm);
        // Rgba8Unorm is always filterable — linear survives the fallback.
        assert_eq!(spec.filter, TargetFilter::Linear);
    }

    #[test]
    fn linear_filter_falls_back_to_nearest_when_not_filterable() {
        let caps = DeviceCaps {
            half_float_renderable: true,
            half_float_filterable: false,
        };
        let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, caps);
        assert_eq!(spec.format, wgpu::TextureFormat::Rgba16Float);
        assert_eq!(spec.filter, TargetFilter::Nearest);
    }

    #[test]
    fn full_caps_resolve_verbatim() {
        let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, DeviceCaps::full());
        assert_eq!(spec.format, wgpu::TextureFormat::Rgba16Float);
        assert_eq!(spec.filter, TargetFilter::Linear);
        assert_eq!(spec.mip_level_count, 11);
        assert_eq!((spec.width, spec.height), (1024, 1024));
    }

    #[test]
    fn mip_count_covers_the_chain() {
        assert_eq!(full_mip_count(1, 1), 1);
        assert_eq!(full_mip_count(2, 2), 2);
        assert_eq!(full_mip_count(1024, 1024), 11);
        assert_eq!(full_mip_count(360, 640), 10);
    }
}

//! Renderer configuration.
//!
//! [`RendererSettings`] is consumed once during [`Renderer::new`] to set up
//! the GPU context and allocate the fixed render-target set. Nothing here is
//! runtime-mutable; post-processing sizes change through the explicit
//! `resize` call on the renderer.
//!
//! [`Renderer::new`]: crate::renderer::Renderer::new

/// Global configuration for renderer initialization.
///
/// | Field              | Description                              | Default            |
/// |--------------------|------------------------------------------|--------------------|
/// | `power_preference` | GPU adapter selection strategy           | `HighPerformance`  |
/// | `clear_color`      | Default framebuffer clear color          | Black (0,0,0,1)    |
/// | `required_features`| Required wgpu features                   | Empty              |
/// | `required_limits`  | Required wgpu limits                     | Default            |
/// | `depth_format`     | Depth buffer texture format              | `Depth32Float`     |
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// GPU adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Background clear color for the main render target.
    ///
    /// May be overridden for the duration of a pass through the render-state
    /// scope guard (the shadow pass clears to white, for example).
    pub clear_color: wgpu::Color,

    /// Required wgpu features that must be supported by the adapter.
    pub required_features: wgpu::Features,

    /// Required wgpu limits (max buffer sizes, binding counts, etc.).
    pub required_limits: wgpu::Limits,

    /// Depth buffer texture format.
    pub depth_format: wgpu::TextureFormat,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            depth_format: wgpu::TextureFormat::Depth32Float,
        }
    }
}

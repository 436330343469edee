//! Bloom pass: bright-pass → separable blur at fixed resolution → additive
//! composite.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::renderer::target::RenderTarget;

const BLOOM_SHADER: &str = include_str!("../../shaders/bloom.wgsl");

/// Fixed bloom configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Height of the internal blur buffers, in texels.
    pub resolution: u32,
    /// Number of horizontal+vertical blur iterations.
    pub kernel: u32,
    pub blur_scale: f32,
    pub intensity: f32,
    pub luminance_threshold: f32,
    pub luminance_smoothing: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            resolution: 360,
            kernel: 4,
            blur_scale: 1.0,
            intensity: 0.9,
            luminance_threshold: 0.7,
            luminance_smoothing: 0.2,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct BloomUniforms {
    texel_size: Vec2,
    direction: Vec2,
    threshold: f32,
    smoothing: f32,
    intensity: f32,
    blur_scale: f32,
}

pub struct BloomPass {
    settings: BloomSettings,
    layout: wgpu::BindGroupLayout,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bright_params: wgpu::Buffer,
    blur_h_params: wgpu::Buffer,
    blur_v_params: wgpu::Buffer,
    composite_params: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl BloomPass {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        settings: BloomSettings,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(BLOOM_SHADER)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let make_pipeline = |label: &str, entry: &str, blend: Option<wgpu::BlendState>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let bright_pipeline = make_pipeline("Bloom Bright Pipeline", "fs_bright", None);
        let blur_pipeline = make_pipeline("Bloom Blur Pipeline", "fs_blur", None);
        let composite_pipeline = make_pipeline("Bloom Composite Pipeline", "fs_composite", None);

        let make_buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BloomUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            settings,
            layout,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            bright_params: make_buffer("Bloom Bright Params"),
            blur_h_params: make_buffer("Bloom Blur H Params"),
            blur_v_params: make_buffer("Bloom Blur V Params"),
            composite_params: make_buffer("Bloom Composite Params"),
            sampler: super::effect_sampler(device, "Bloom Sampler"),
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> BloomSettings {
        self.settings
    }

    /// Uploads texel metrics for the internal blur-buffer size.
    pub fn resize(&self, queue: &wgpu::Queue, blur_width: u32, blur_height: u32) {
        let texel = Vec2::new(1.0 / blur_width as f32, 1.0 / blur_height as f32);
        let base = BloomUniforms {
            texel_size: texel,
            direction: Vec2::ZERO,
            threshold: self.settings.luminance_threshold,
            smoothing: self.settings.luminance_smoothing,
            intensity: self.settings.intensity,
            blur_scale: self.settings.blur_scale,
        };

        queue.write_buffer(&self.bright_params, 0, bytemuck::bytes_of(&base));
        queue.write_buffer(
            &self.blur_h_params,
            0,
            bytemuck::bytes_of(&BloomUniforms {
                direction: Vec2::X,
                ..base
            }),
        );
        queue.write_buffer(
            &self.blur_v_params,
            0,
            bytemuck::bytes_of(&BloomUniforms {
                direction: Vec2::Y,
                ..base
            }),
        );
        queue.write_buffer(&self.composite_params, 0, bytemuck::bytes_of(&base));
    }

    fn bind(
        &self,
        device: &wgpu::Device,
        source: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bloom),
                },
            ],
        })
    }

    /// Runs the full bloom chain:
    /// `source → bright → (blur H ↔ blur V)ⁿ → composite(source, bright) → dest`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &RenderTarget,
        bright: &RenderTarget,
        swap: &RenderTarget,
        dest: &RenderTarget,
    ) {
        // Bright pass
        let bind = self.bind(device, source.view(), source.view(), &self.bright_params);
        super::fullscreen_draw(encoder, "Bloom Bright", &self.bright_pipeline, &bind, bright.view());

        // Separable blur, ping-ponging bright ↔ swap
        for _ in 0..self.settings.kernel {
            let bind = self.bind(device, bright.view(), bright.view(), &self.blur_h_params);
            super::fullscreen_draw(encoder, "Bloom Blur H", &self.blur_pipeline, &bind, swap.view());

            let bind = self.bind(device, swap.view(), swap.view(), &self.blur_v_params);
            super::fullscreen_draw(encoder, "Bloom Blur V", &self.blur_pipeline, &bind, bright.view());
        }

        // Composite
        let bind = self.bind(device, source.view(), bright.view(), &self.composite_params);
        super::fullscreen_draw(
            encoder,
            "Bloom Composite",
            &self.composite_pipeline,
            &bind,
            dest.view(),
        );
    }
}

//! Vignette pass (eskil variant) — the final stage, writing the LDR output.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

const VIGNETTE_SHADER: &str = include_str!("../../shaders/vignette.wgsl");

/// Fixed vignette configuration (eskil style).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignetteSettings {
    pub offset: f32,
    pub darkness: f32,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            offset: 0.15,
            darkness: 20.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct VignetteUniforms {
    offset: f32,
    darkness: f32,
    tone_mapping: u32,
    _pad: f32,
}

pub struct VignettePass {
    settings: VignetteSettings,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl VignettePass {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        settings: VignetteSettings,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vignette Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(VIGNETTE_SHADER)),
        });

        let layout = super::effect_layout(device, "Vignette Layout");
        let pipeline =
            super::effect_pipeline(device, "Vignette Pipeline", &shader, &layout, output_format);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vignette Uniforms"),
            size: std::mem::size_of::<VignetteUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            settings,
            layout,
            pipeline,
            buffer,
            sampler: super::effect_sampler(device, "Vignette Sampler"),
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> VignetteSettings {
        self.settings
    }

    /// Uploads parameters; `tone_mapping` follows the frame's render state.
    pub fn update(&self, queue: &wgpu::Queue, tone_mapping: bool) {
        let uniforms = VignetteUniforms {
            offset: self.settings.offset,
            darkness: self.settings.darkness,
            tone_mapping: u32::from(tone_mapping),
            _pad: 0.0,
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vignette BindGroup"),
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
                    resource: self.buffer.as_entire_binding(),
                },
            ],
        });

        super::fullscreen_draw(encoder, "Vignette Pass", &self.pipeline, &bind_group, output);
    }
}

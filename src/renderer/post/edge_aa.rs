//! Edge-detection antialiasing pass.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::renderer::target::RenderTarget;

const EDGE_AA_SHADER: &str = include_str!("../../shaders/edge_aa.wgsl");

/// Fixed luma edge-detection threshold.
pub const EDGE_THRESHOLD: f32 = 0.001;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct EdgeAaUniforms {
    texel_size: Vec2,
    edge_threshold: f32,
    _pad: f32,
}

pub struct EdgeAaPass {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl EdgeAaPass {
    #[must_use]
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Edge AA Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(EDGE_AA_SHADER)),
        });

        let layout = super::effect_layout(device, "Edge AA Layout");
        let pipeline = super::effect_pipeline(device, "Edge AA Pipeline", &shader, &layout, format);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Edge AA Uniforms"),
            size: std::mem::size_of::<EdgeAaUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = super::effect_sampler(device, "Edge AA Sampler");

        Self {
            layout,
            pipeline,
            buffer,
            sampler,
        }
    }

    /// Uploads texel metrics for the current output size.
    pub fn resize(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        let uniforms = EdgeAaUniforms {
            texel_size: Vec2::new(1.0 / width as f32, 1.0 / height as f32),
            edge_threshold: EDGE_THRESHOLD,
            _pad: 0.0,
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        dest: &RenderTarget,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Edge AA BindGroup"),
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

        super::fullscreen_draw(encoder, "Edge AA Pass", &self.pipeline, &bind_group, dest.view());
    }
}

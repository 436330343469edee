//! Shadow Pass
//!
//! Renders every shadow-relevant object with its depth variant into the
//! shadow color target, from the light's viewpoint. For the duration of the
//! pass the clear color is forced to solid white and the environment
//! background is detached so the clear dominates; both revert through the
//! state scope on every exit path.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use crate::renderer::graph::RenderNode;
use crate::renderer::orchestrator::FrameContext;
use crate::renderer::plan::{PassStage, VariantRole};
use crate::renderer::shader::{ShaderDefines, preprocess};
use crate::renderer::state::ActiveTarget;
use crate::renderer::uniforms::{DepthUniforms, LightUniforms, ModelUniforms, pack_depth};
use crate::resources::geometry::Vertex;

const DEPTH_SHADER: &str = include_str!("../../shaders/depth.wgsl");

/// Dynamic-offset stride for per-object uniforms.
fn model_stride(device: &wgpu::Device) -> u32 {
    let min_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
    (std::mem::size_of::<ModelUniforms>() as u32).div_ceil(min_alignment) * min_alignment
}

struct FamilyBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,

    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,

    material_layout: wgpu::BindGroupLayout,
    family_bindings: FxHashMap<u64, FamilyBinding>,

    model_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_capacity: u32,
    model_stride: u32,

    depth_view: wgpu::TextureView,
}

impl ShadowPass {
    #[must_use]
    pub fn new(device: &wgpu::Device, depth_format: wgpu::TextureFormat, map_size: u32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Depth Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(preprocess(
                DEPTH_SHADER,
                &ShaderDefines::new(),
            ))),
        });

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Light Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, false)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Material Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false)],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Model Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, true)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[Some(&light_layout), Some(&material_layout), Some(&model_layout)],
            immediate_size: 0,
        });

        // Blend carried over from the depth material: src·alpha + dst·srcColor.
        let blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::Src,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::REPLACE,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Light Uniforms"),
            size: std::mem::size_of::<LightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Light BindGroup"),
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let stride = model_stride(device);
        let (model_buffer, model_bind_group) =
            create_model_buffer(device, &model_layout, stride, 16, "Shadow Model Uniforms");

        // The light acts as the camera; the shadow target needs its own
        // depth buffer at map resolution.
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Depth"),
            size: wgpu::Extent3d {
                width: map_size,
                height: map_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            pipeline,
            light_buffer,
            light_bind_group,
            material_layout,
            family_bindings: FxHashMap::default(),
            model_layout,
            model_buffer,
            model_bind_group,
            model_capacity: 16,
            model_stride: stride,
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }

    fn ensure_model_capacity(&mut self, device: &wgpu::Device, required: u32) {
        if required <= self.model_capacity {
            return;
        }
        let mut capacity = self.model_capacity.max(1);
        while capacity < required {
            capacity = capacity.saturating_mul(2);
        }
        let (buffer, bind_group) = create_model_buffer(
            device,
            &self.model_layout,
            self.model_stride,
            capacity,
            "Shadow Model Uniforms",
        );
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_capacity = capacity;
    }
}

impl RenderNode for ShadowPass {
    fn name(&self) -> &'static str {
        PassStage::ShadowMap.name()
    }

    fn prepare(&mut self, ctx: &mut FrameContext<'_>) {
        let Some(pass) = ctx.plan.pass(PassStage::ShadowMap) else {
            return;
        };

        // Light camera uniforms.
        let light = LightUniforms {
            view_projection: ctx.lighting.view_projection,
            position: ctx.lighting.position,
            time: ctx.time,
        };
        ctx.gpu
            .queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&light));

        // Depth-contract uniforms, one buffer per material family store.
        for draw in &pass.draws {
            debug_assert_eq!(draw.role, VariantRole::Depth);
            let object = &ctx.scene.objects[draw.object_index];
            let store = object.depth_variant.store().read();
            let packed = pack_depth(&store);
            let binding = self
                .family_bindings
                .entry(store.id())
                .or_insert_with(|| {
                    let buffer = ctx.gpu.device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Shadow Depth Uniforms"),
                        size: std::mem::size_of::<DepthUniforms>() as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    let bind_group =
                        ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some("Shadow Depth BindGroup"),
                            layout: &self.material_layout,
                            entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: buffer.as_entire_binding(),
                            }],
                        });
                    FamilyBinding { buffer, bind_group }
                });
            ctx.gpu
                .queue
                .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&packed));
        }

        // Per-object model uniforms at dynamic offsets.
        self.ensure_model_capacity(&ctx.gpu.device, pass.draws.len() as u32);
        let mut staged = vec![0u8; self.model_stride as usize * pass.draws.len().max(1)];
        for (slot, draw) in pass.draws.iter().enumerate() {
            let object = &ctx.scene.objects[draw.object_index];
            let model = ModelUniforms {
                world: object.world,
                base_color: object.depth_variant.base_color().extend(1.0),
            };
            let offset = slot * self.model_stride as usize;
            let bytes = bytemuck::bytes_of(&model);
            staged[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        ctx.gpu.queue.write_buffer(&self.model_buffer, 0, &staged);
    }

    fn run(&self, ctx: &mut FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        let Some(pass_desc) = ctx.plan.pass(PassStage::ShadowMap) else {
            return;
        };

        // Scoped overrides: white clear, background detached, shadow target
        // active. Restored on drop even if encoding bails early.
        let mut scope = ctx.state.scope();
        scope.clear_color = wgpu::Color::WHITE;
        scope.background_attached = false;
        scope.active_target = ActiveTarget::Offscreen(ctx.targets.shadow.id());

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Color Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.targets.shadow.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scope.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.light_bind_group, &[]);

        for (slot, draw) in pass_desc.draws.iter().enumerate() {
            let object = &ctx.scene.objects[draw.object_index];
            let store_id = object.depth_variant.store().read().id();
            let Some(binding) = self.family_bindings.get(&store_id) else {
                continue;
            };
            pass.set_bind_group(1, &binding.bind_group, &[]);

            let offset = slot as u32 * self.model_stride;
            pass.set_bind_group(2, &self.model_bind_group, &[offset]);

            let Some(mesh) = ctx.meshes.get(object.mesh.id()) else {
                continue;
            };
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_model_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u32,
    capacity: u32,
    label: &'static str,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: u64::from(stride) * u64::from(capacity),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

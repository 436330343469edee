//! Main Color Pass
//!
//! Renders every object with its color variant into the HDR scene color
//! buffer, back-to-front by named pass priority. Pipelines are cached per
//! shader-define set; material bind groups are cached per family store and
//! rebuilt only when a bound texture identity changes.

use std::borrow::Cow;

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::renderer::graph::RenderNode;
use crate::renderer::orchestrator::FrameContext;
use crate::renderer::plan::{PassStage, VariantRole};
use crate::renderer::shader::{ShaderDefines, preprocess};
use crate::renderer::uniforms::{
    GlobalUniforms, ModelUniforms, ShadingUniforms, pack_shading,
};
use crate::resources::geometry::Vertex;
use crate::resources::texture::TextureHandle;

const SHADING_SHADER: &str = include_str!("../../shaders/shading.wgsl");

fn model_stride(device: &wgpu::Device) -> u32 {
    let min_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
    (std::mem::size_of::<ModelUniforms>() as u32).div_ceil(min_alignment) * min_alignment
}

/// 1×1 fallback textures bound when a store's texture slot is empty.
pub struct FallbackTextures {
    pub white: TextureHandle,
    pub flat_normal: TextureHandle,
    pub noise: TextureHandle,
    pub black_cube: TextureHandle,
}

impl FallbackTextures {
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            white: solid_texture(device, queue, "Fallback White", [255, 255, 255, 255]),
            flat_normal: solid_texture(device, queue, "Fallback Normal", [128, 128, 255, 255]),
            noise: noise_texture(device, queue),
            black_cube: cube_texture(device, queue, "Fallback Cube", [0, 0, 0, 255]),
        }
    }
}

struct FamilyBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_ids: (u64, u64, u64),
}

pub struct ForwardPass {
    global_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    pipelines: FxHashMap<ShaderDefines, wgpu::RenderPipeline>,

    global_buffer: wgpu::Buffer,
    global_bind_group: Option<wgpu::BindGroup>,
    global_env_id: u64,

    repeat_sampler: wgpu::Sampler,

    family_bindings: FxHashMap<u64, FamilyBinding>,

    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_capacity: u32,
    model_stride: u32,
}

impl ForwardPass {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Global Layout"),
            entries: &[
                buffer_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                texture_entry(3, wgpu::TextureViewDimension::Cube),
                sampler_entry(4),
                texture_entry(5, wgpu::TextureViewDimension::D2),
                sampler_entry(6),
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Material Layout"),
            entries: &[
                buffer_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                texture_entry(2, wgpu::TextureViewDimension::D2),
                texture_entry(3, wgpu::TextureViewDimension::D2),
                sampler_entry(4),
            ],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Model Layout"),
            entries: &[buffer_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(&global_layout), Some(&material_layout), Some(&model_layout)],
            immediate_size: 0,
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forward Global Uniforms"),
            size: std::mem::size_of::<GlobalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Forward Repeat Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let stride = model_stride(device);
        let (model_buffer, model_bind_group) =
            create_model_buffer(device, &model_layout, stride, 16);

        Self {
            global_layout,
            material_layout,
            model_layout,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            global_buffer,
            global_bind_group: None,
            global_env_id: 0,
            repeat_sampler,
            family_bindings: FxHashMap::default(),
            model_buffer,
            model_bind_group,
            model_capacity: 16,
            model_stride: stride,
        }
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        depth_format: wgpu::TextureFormat,
        scene_format: wgpu::TextureFormat,
        defines: &ShaderDefines,
    ) {
        if self.pipelines.contains_key(defines) {
            return;
        }

        let source = preprocess(SHADING_SHADER, defines);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shading Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forward Pipeline"),
            layout: Some(&self.pipeline_layout),
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
                    format: scene_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
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

        self.pipelines.insert(defines.clone(), pipeline);
    }

    fn ensure_global_bind_group(&mut self, ctx: &FrameContext<'_>) {
        let env_id = ctx.env_texture.id();
        if self.global_bind_group.is_some() && self.global_env_id == env_id {
            return;
        }
        self.global_env_id = env_id;

        self.global_bind_group = Some(ctx.gpu.device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                label: Some("Forward Global BindGroup"),
                layout: &self.global_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.global_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(ctx.targets.shadow.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(ctx.targets.shadow.sampler()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(ctx.env_texture.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(
                            ctx.targets.transmission.view(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::Sampler(
                            ctx.targets.transmission.sampler(),
                        ),
                    },
                ],
            },
        ));
    }

    fn ensure_family_binding(
        &mut self,
        ctx: &FrameContext<'_>,
        store_id: u64,
        packed: &ShadingUniforms,
        textures: (TextureHandle, TextureHandle, TextureHandle),
    ) {
        let ids = (textures.0.id(), textures.1.id(), textures.2.id());
        let rebuild = match self.family_bindings.get(&store_id) {
            Some(binding) => binding.texture_ids != ids,
            None => true,
        };

        if rebuild {
            let buffer = ctx.gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Forward Shading Uniforms"),
                size: std::mem::size_of::<ShadingUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Forward Material BindGroup"),
                layout: &self.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(textures.0.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(textures.1.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(textures.2.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                    },
                ],
            });
            self.family_bindings.insert(
                store_id,
                FamilyBinding {
                    buffer,
                    bind_group,
                    texture_ids: ids,
                },
            );
        }

        let binding = &self.family_bindings[&store_id];
        ctx.gpu
            .queue
            .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(packed));
    }

    fn ensure_model_capacity(&mut self, device: &wgpu::Device, required: u32) {
        if required <= self.model_capacity {
            return;
        }
        let mut capacity = self.model_capacity.max(1);
        while capacity < required {
            capacity = capacity.saturating_mul(2);
        }
        let (buffer, bind_group) =
            create_model_buffer(device, &self.model_layout, self.model_stride, capacity);
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_capacity = capacity;
    }
}

impl RenderNode for ForwardPass {
    fn name(&self) -> &'static str {
        PassStage::MainColor.name()
    }

    fn prepare(&mut self, ctx: &mut FrameContext<'_>) {
        let Some(pass) = ctx.plan.pass(PassStage::MainColor) else {
            return;
        };

        // Globals
        let (width, height) = ctx.targets.scene_color.size();
        let aspect = width as f32 / height as f32;
        let map_size = ctx.targets.shadow.size().0 as f32;
        let globals = GlobalUniforms {
            view_projection: ctx.scene.camera.view_projection(aspect),
            light_view_projection: ctx.lighting.view_projection,
            camera_position: ctx.scene.camera.position,
            time: ctx.time,
            viewport_size: Vec2::new(width as f32, height as f32),
            shadow_texel: Vec2::splat(1.0 / map_size),
        };
        ctx.gpu
            .queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&globals));

        self.ensure_global_bind_group(ctx);

        // Pipelines + family uniforms
        for draw in &pass.draws {
            debug_assert_eq!(draw.role, VariantRole::Color);
            let object = &ctx.scene.objects[draw.object_index];
            let variant = &object.color_variant;

            let defines = ShaderDefines::from_features(variant.features());
            self.ensure_pipeline(
                &ctx.gpu.device,
                ctx.gpu.depth_format,
                ctx.targets.scene_color.spec().format,
                &defines,
            );

            let store = variant.store().read();
            let packed = pack_shading(&store);
            let normal = store
                .get("normal_texture")
                .and_then(crate::resources::uniform_store::UniformValue::as_texture)
                .cloned()
                .unwrap_or_else(|| ctx.fallbacks.flat_normal.clone());
            let glitter = store
                .get("glitter_noise_texture")
                .and_then(crate::resources::uniform_store::UniformValue::as_texture)
                .cloned()
                .unwrap_or_else(|| ctx.fallbacks.noise.clone());
            let blue_noise = store
                .get("blue_noise_texture")
                .and_then(crate::resources::uniform_store::UniformValue::as_texture)
                .cloned()
                .unwrap_or_else(|| ctx.fallbacks.noise.clone());
            let store_id = store.id();
            drop(store);

            self.ensure_family_binding(ctx, store_id, &packed, (normal, glitter, blue_noise));
        }

        // Model uniforms
        self.ensure_model_capacity(&ctx.gpu.device, pass.draws.len() as u32);
        let mut staged = vec![0u8; self.model_stride as usize * pass.draws.len().max(1)];
        for (slot, draw) in pass.draws.iter().enumerate() {
            let object = &ctx.scene.objects[draw.object_index];
            let model = ModelUniforms {
                world: object.world,
                base_color: object.color_variant.base_color().extend(1.0),
            };
            let offset = slot * self.model_stride as usize;
            let bytes = bytemuck::bytes_of(&model);
            staged[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        ctx.gpu.queue.write_buffer(&self.model_buffer, 0, &staged);
    }

    fn run(&self, ctx: &mut FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        let Some(pass_desc) = ctx.plan.pass(PassStage::MainColor) else {
            return;
        };
        let Some(global_bind_group) = &self.global_bind_group else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Color Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.targets.scene_color.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.state.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_bind_group(0, global_bind_group, &[]);

        // Draw in plan order: Background → Opaque → Instanced → Liquid.
        for (slot, draw) in pass_desc.draws.iter().enumerate() {
            let object = &ctx.scene.objects[draw.object_index];
            let defines = ShaderDefines::from_features(object.color_variant.features());
            let Some(pipeline) = self.pipelines.get(&defines) else {
                continue;
            };
            pass.set_pipeline(pipeline);

            let store_id = object.color_variant.store().read().id();
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

// ============================================================================
// Helpers
// ============================================================================

fn buffer_entry(
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

fn texture_entry(binding: u32, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_model_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u32,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Forward Model Uniforms"),
        size: u64::from(stride) * u64::from(capacity),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Forward Model BindGroup"),
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

fn solid_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: [u8; 4],
) -> TextureHandle {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    TextureHandle::from_texture(label, texture, view)
}

/// 64×64 hash-based value noise for the glitter/dither fallbacks.
fn noise_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> TextureHandle {
    const SIZE: u32 = 64;
    let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            // xorshift-style texel hash, deterministic across runs
            let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263);
            h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
            let value = ((h >> 16) & 0xff) as u8;
            data.extend_from_slice(&[value, value, value, 255]);
        }
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Fallback Noise"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(SIZE * 4),
            rows_per_image: Some(SIZE),
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    TextureHandle::from_texture("Fallback Noise", texture, view)
}

fn cube_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: [u8; 4],
) -> TextureHandle {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for layer in 0..6 {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    TextureHandle::from_texture(label, texture, view)
}

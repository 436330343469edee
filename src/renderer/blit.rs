//! Single-Pass Renderer（copy / resample）
//!
//! 用一个全屏三角形把一张纹理绘制到一个渲染目标。调用期间：
//! 1. 记录当前激活目标与色调映射状态（[`StateScope`]）
//! 2. 关闭色调映射、切换激活目标
//! 3. 清屏并绘制
//! 4. guard Drop 时恢复先前状态（所有退出路径）
//!
//! 跨帧可重入；自身执行期间再次进入是错误（目标栈会递归），用
//! 占用标记把这种误用变成 [`FrameError::RecursiveBlit`]。
//!
//! 管线按目标格式缓存，mipmap 链生成复用同一套 blit 管线。

use std::borrow::Cow;
use std::cell::Cell;

use rustc_hash::FxHashMap;

use crate::errors::FrameError;
use crate::renderer::state::{ActiveTarget, RenderState};
use crate::renderer::target::RenderTarget;

const BLIT_SHADER: &str = include_str!("../shaders/blit.wgsl");

pub struct BlitRenderer {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    in_flight: Cell<bool>,
}

impl BlitRenderer {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(BLIT_SHADER)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Layout"),
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
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            layout,
            sampler,
            shader,
            pipelines: FxHashMap::default(),
            in_flight: Cell::new(false),
        }
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Blit Pipeline {format:?}")),
            layout: Some(
                &device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Blit Pipeline Layout"),
                    bind_group_layouts: &[Some(&self.layout)],
                    immediate_size: 0,
                }),
            ),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
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
    }

    /// 预热指定格式的管线（prepare 阶段调用，此时持有 &mut self）
    pub fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if !self.pipelines.contains_key(&format) {
            let pipeline = self.create_pipeline(device, format);
            self.pipelines.insert(format, pipeline);
        }
    }

    /// Copies `source` into `target` (mip 0) with a fullscreen triangle.
    ///
    /// Clears first; tone mapping is disabled for the duration of the call
    /// and the previously active target is restored afterwards.
    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        state: &mut RenderState,
        source: &wgpu::TextureView,
        target: &RenderTarget,
    ) -> Result<(), FrameError> {
        if self.in_flight.replace(true) {
            self.in_flight.set(false);
            return Err(FrameError::RecursiveBlit);
        }

        {
            let mut scope = state.scope();
            scope.tone_mapping_enabled = false;
            scope.active_target = ActiveTarget::Offscreen(target.id());

            let pipeline = if let Some(pipeline) = self.pipelines.get(&target.spec().format) {
                pipeline.clone()
            } else {
                log::warn!(
                    "BlitRenderer: pipeline not pre-warmed for {:?}, creating on-the-fly",
                    target.spec().format
                );
                self.create_pipeline(device, target.spec().format)
            };

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blit BindGroup"),
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
                ],
            });

            let attachment = target.attachment_view();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &attachment,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.in_flight.set(false);
        Ok(())
    }

    /// Walks the mip chain of `texture`, downsampling level i into i+1.
    pub fn generate_mipmaps(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) {
        let mip_count = texture.mip_level_count();
        if mip_count < 2 {
            return;
        }

        let format = texture.format();
        let pipeline = if let Some(pipeline) = self.pipelines.get(&format) {
            pipeline.clone()
        } else {
            log::warn!("BlitRenderer: mip pipeline not pre-warmed for {format:?}");
            self.create_pipeline(device, format)
        };

        for mip in 0..mip_count - 1 {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Mip Src"),
                base_mip_level: mip,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Mip Dst"),
                base_mip_level: mip + 1,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mip BindGroup"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mip Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

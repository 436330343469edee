//! Post-Processing Chain
//!
//! Fixed, ordered full-screen effect sequence applied to the main color
//! buffer: edge-detection antialiasing → bloom → vignette. Runs exactly
//! once per frame after the main color pass; resizing is an explicit call,
//! never automatic.

pub mod bloom;
pub mod edge_aa;
pub mod vignette;

pub use bloom::{BloomPass, BloomSettings};
pub use edge_aa::EdgeAaPass;
pub use vignette::{VignettePass, VignetteSettings};

use crate::errors::Result;
use crate::renderer::context::WgpuContext;
use crate::renderer::graph::RenderNode;
use crate::renderer::orchestrator::FrameContext;
use crate::renderer::plan::PassStage;
use crate::renderer::target::{RenderTarget, RenderTargetPool, TargetConfig};

/// The fixed effect chain with its intermediate buffers.
pub struct PostProcessChain {
    edge_aa: EdgeAaPass,
    bloom: BloomPass,
    vignette: VignettePass,

    // Surface-sized ping targets (HDR)
    ping_a: RenderTarget,
    ping_b: RenderTarget,
    // Fixed-resolution blur buffers (HDR)
    bloom_bright: RenderTarget,
    bloom_swap: RenderTarget,

    width: u32,
    height: u32,
}

const PING_CONFIG: TargetConfig = TargetConfig::SCENE;

impl PostProcessChain {
    pub fn new(
        gpu: &WgpuContext,
        pool: &mut RenderTargetPool,
        scene_format: wgpu::TextureFormat,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let edge_aa = EdgeAaPass::new(&gpu.device, scene_format);
        let bloom = BloomPass::new(&gpu.device, scene_format, BloomSettings::default());
        let vignette = VignettePass::new(&gpu.device, output_format, VignetteSettings::default());

        let (ping_a, ping_b, bloom_bright, bloom_swap) =
            Self::acquire_targets(gpu, pool, &bloom.settings(), width, height)?;

        edge_aa.resize(&gpu.queue, width, height);
        let (bw, bh) = (bloom_bright.size().0, bloom_bright.size().1);
        bloom.resize(&gpu.queue, bw, bh);

        Ok(Self {
            edge_aa,
            bloom,
            vignette,
            ping_a,
            ping_b,
            bloom_bright,
            bloom_swap,
            width,
            height,
        })
    }

    fn acquire_targets(
        gpu: &WgpuContext,
        pool: &mut RenderTargetPool,
        settings: &BloomSettings,
        width: u32,
        height: u32,
    ) -> Result<(RenderTarget, RenderTarget, RenderTarget, RenderTarget)> {
        let ping_a = pool.acquire(&gpu.device, gpu.caps, "Post Ping A", width, height, PING_CONFIG)?;
        let ping_b = pool.acquire(&gpu.device, gpu.caps, "Post Ping B", width, height, PING_CONFIG)?;

        // Blur buffers at the fixed bloom resolution (height-anchored).
        let blur_h = settings.resolution.min(height.max(1));
        let blur_w = ((width as f32 / height.max(1) as f32) * blur_h as f32).max(1.0) as u32;
        let bloom_bright =
            pool.acquire(&gpu.device, gpu.caps, "Bloom Bright", blur_w, blur_h, PING_CONFIG)?;
        let bloom_swap =
            pool.acquire(&gpu.device, gpu.caps, "Bloom Swap", blur_w, blur_h, PING_CONFIG)?;

        Ok((ping_a, ping_b, bloom_bright, bloom_swap))
    }

    /// Explicit resize: re-acquires the intermediate targets for the new
    /// output size. Must be called whenever the output surface changes.
    pub fn resize(
        &mut self,
        gpu: &WgpuContext,
        pool: &mut RenderTargetPool,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }

        let (ping_a, ping_b, bloom_bright, bloom_swap) =
            Self::acquire_targets(gpu, pool, &self.bloom.settings(), width, height)?;
        self.ping_a = ping_a;
        self.ping_b = ping_b;
        self.bloom_bright = bloom_bright;
        self.bloom_swap = bloom_swap;
        self.width = width;
        self.height = height;

        self.edge_aa.resize(&gpu.queue, width, height);
        let (bw, bh) = self.bloom_bright.size();
        self.bloom.resize(&gpu.queue, bw, bh);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl RenderNode for PostProcessChain {
    fn name(&self) -> &'static str {
        PassStage::PostProcess.name()
    }

    fn prepare(&mut self, ctx: &mut FrameContext<'_>) {
        self.vignette
            .update(&ctx.gpu.queue, ctx.state.tone_mapping_enabled);
    }

    fn run(&self, ctx: &mut FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        let device = &ctx.gpu.device;

        // 1. Antialiasing: scene color → ping A
        self.edge_aa
            .render(device, encoder, ctx.targets.scene_color.view(), &self.ping_a);

        // 2. Bloom: ping A (+ internal blur buffers) → ping B
        self.bloom.render(
            device,
            encoder,
            &self.ping_a,
            &self.bloom_bright,
            &self.bloom_swap,
            &self.ping_b,
        );

        // 3. Vignette + tone map → output surface
        self.vignette
            .render(device, encoder, self.ping_b.view(), &ctx.targets.output_view);
    }
}

// ============================================================================
// Shared effect plumbing
// ============================================================================

pub(crate) fn effect_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
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
        ],
    })
}

pub(crate) fn effect_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[Some(layout)],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
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

pub(crate) fn effect_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

pub(crate) fn fullscreen_draw(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    view: &wgpu::TextureView,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

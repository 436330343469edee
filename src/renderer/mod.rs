//! The renderer: GPU context, the per-session target set, and the frame
//! orchestrator.

pub mod blit;
pub mod context;
pub mod geometry;
pub mod graph;
pub mod orchestrator;
pub mod passes;
pub mod plan;
pub mod post;
pub mod settings;
pub mod shader;
pub mod state;
pub mod target;
pub mod uniforms;

pub use context::{DeviceCaps, WgpuContext};
pub use orchestrator::{FrameOrchestrator, LiquidRig, ShadingRig};
pub use plan::{FramePlan, PassStage};
pub use settings::RendererSettings;
pub use state::RenderState;
pub use target::{RenderTargetPool, TargetConfig};

use crate::errors::Result;
use crate::scene::light::ShadowFrustum;
use crate::scene::scene::Scene;

/// Top-level renderer for one output surface.
pub struct Renderer {
    gpu: WgpuContext,
    pool: RenderTargetPool,
    orchestrator: FrameOrchestrator,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Initializes the device and the fixed target set. Target allocation
    /// failure here is fatal — the session cannot run without it.
    pub fn new(settings: &RendererSettings, width: u32, height: u32) -> Result<Self> {
        let gpu = WgpuContext::new_blocking(settings)?;
        let mut pool = RenderTargetPool::new();
        let orchestrator = FrameOrchestrator::new(
            &gpu,
            &mut pool,
            width,
            height,
            ShadowFrustum::default().map_size,
        )?;
        Ok(Self {
            gpu,
            pool,
            orchestrator,
            width,
            height,
        })
    }

    /// Renders one frame (see [`FrameOrchestrator::render_frame`]).
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        rigs: &mut [ShadingRig],
        dt: f32,
    ) -> Result<()> {
        self.orchestrator.render_frame(&self.gpu, scene, rigs, dt)
    }

    /// Explicit output resize.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        self.width = width;
        self.height = height;
        self.orchestrator
            .resize(&self.gpu, &mut self.pool, width, height)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn gpu(&self) -> &WgpuContext {
        &self.gpu
    }

    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }

    /// Pass names executed last frame, in order.
    #[must_use]
    pub fn pass_journal(&self) -> &[&'static str] {
        self.orchestrator.journal()
    }

    /// Reads the final output surface back as tightly packed RGBA8 rows.
    ///
    /// Blocks on the device; meant for headless capture, not the hot path.
    pub fn read_output_rgba(&self) -> Vec<u8> {
        let (width, height) = (self.width, self.height);
        let bytes_per_row = (width * 4).div_ceil(256) * 256;

        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Readback"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.orchestrator.targets().output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.gpu.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        });
        receiver
            .recv()
            .expect("map_async callback dropped")
            .expect("output readback mapping failed");

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&mapped[start..start + (width * 4) as usize]);
        }
        drop(mapped);
        buffer.unmap();
        pixels
    }
}

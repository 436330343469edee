//! Transmission Capture Pass
//!
//! 把场景颜色缓冲复制到 transmission 捕获目标，再重建其 mip 链，
//! 供透明物体按粗糙度采样"身后"的画面。
//!
//! # 执行时机
//! - 仅当场景中存在使用 transmission 的物体时进入计划
//! - 必须在 MainColor 之前完整结束：该 Pass 采样的缓冲正是透明物体
//!   稍后要栅格化进去的那一张，顺序颠倒会让物体采到自己（反馈伪影）

use crate::renderer::graph::RenderNode;
use crate::renderer::orchestrator::FrameContext;
use crate::renderer::plan::PassStage;

#[derive(Default)]
pub struct TransmissionCapturePass;

impl TransmissionCapturePass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RenderNode for TransmissionCapturePass {
    fn name(&self) -> &'static str {
        PassStage::TransmissionCapture.name()
    }

    fn run(&self, ctx: &mut FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        if !ctx.plan.uses_transmission() {
            return;
        }

        // Copy the scene color buffer as it stands, then refresh the
        // roughness mip chain.
        if let Err(err) = ctx.blit.render(
            &ctx.gpu.device,
            encoder,
            ctx.state,
            ctx.targets.scene_color.view(),
            &ctx.targets.transmission,
        ) {
            log::error!("transmission capture failed: {err}");
            return;
        }

        ctx.blit.generate_mipmaps(
            &ctx.gpu.device,
            encoder,
            ctx.targets.transmission.texture(),
        );
    }
}

//! 渲染图执行器
//!
//! `RenderGraph` 按固定顺序执行渲染节点。单个 CommandEncoder 贯穿整个图，
//! 每个节点包在 Debug Group 中便于 GPU 调试。执行过程把节点名写入帧日志
//! （pass journal），测试据此断言通道顺序不变式。

use crate::renderer::orchestrator::FrameContext;

/// 渲染节点 Trait
///
/// - `prepare`：可变阶段，分配资源、写 uniform buffer
/// - `run`：录制 GPU 命令，不做内存分配
pub trait RenderNode {
    /// 节点名称，用于调试与帧日志
    fn name(&self) -> &'static str;

    /// 准备阶段
    fn prepare(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// 执行阶段
    fn run(&self, ctx: &mut FrameContext<'_>, encoder: &mut wgpu::CommandEncoder);
}

/// Ordered pass-name log of one frame.
#[derive(Debug, Default, Clone)]
pub struct PassJournal {
    entries: Vec<&'static str>,
}

impl PassJournal {
    pub fn record(&mut self, name: &'static str) {
        self.entries.push(name);
    }

    #[must_use]
    pub fn entries(&self) -> &[&'static str] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// 渲染图：节点按添加顺序执行
pub struct RenderGraph<'n> {
    nodes: Vec<&'n mut dyn RenderNode>,
}

impl<'n> RenderGraph<'n> {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline]
    pub fn add_node(&mut self, node: &'n mut dyn RenderNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// 执行渲染图：prepare 全部节点，再统一录制并提交
    pub fn execute(mut self, ctx: &mut FrameContext<'_>) {
        for node in &mut self.nodes {
            node.prepare(ctx);
        }

        let mut encoder = ctx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Graph Encoder"),
            });

        for node in &self.nodes {
            encoder.push_debug_group(node.name());
            ctx.journal.record(node.name());
            node.run(ctx, &mut encoder);
            encoder.pop_debug_group();
        }

        ctx.gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for RenderGraph<'_> {
    fn default() -> Self {
        Self::new()
    }
}

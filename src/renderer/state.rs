//! 渲染状态与作用域恢复
//!
//! 将原本散落在设备上的可变状态（激活的渲染目标、色调映射开关、清屏色、
//! 环境背景挂载）建模为显式数据。任何 Pass 对这些字段的修改都必须通过
//! [`StateScope`] 进行：guard 在创建时记录快照，在 **所有** 退出路径上
//! （包括提前返回与错误传播）于 Drop 中恢复。

/// Which target the next clear/draw addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTarget {
    /// The default framebuffer (final output surface).
    #[default]
    Surface,
    /// An offscreen render target, identified by its pool id.
    Offscreen(u64),
}

/// Explicit model of the device state the passes toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub active_target: ActiveTarget,
    pub tone_mapping_enabled: bool,
    pub clear_color: wgpu::Color,
    /// Whether the environment background participates in clears/draws.
    /// Detached during the shadow pass so the clear color dominates.
    pub background_attached: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            active_target: ActiveTarget::Surface,
            tone_mapping_enabled: true,
            clear_color: wgpu::Color::BLACK,
            background_attached: true,
        }
    }
}

impl RenderState {
    /// Opens a restore scope. Mutations through the returned guard are
    /// rolled back when the guard drops.
    pub fn scope(&mut self) -> StateScope<'_> {
        let saved = self.clone();
        StateScope { state: self, saved }
    }
}

/// Drop-guard over [`RenderState`].
///
/// 持有期间通过 `DerefMut` 自由修改状态；离开作用域即恢复快照。
pub struct StateScope<'a> {
    state: &'a mut RenderState,
    saved: RenderState,
}

impl StateScope<'_> {
    /// The snapshot this scope will restore.
    #[must_use]
    pub fn saved(&self) -> &RenderState {
        &self.saved
    }
}

impl std::ops::Deref for StateScope<'_> {
    type Target = RenderState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl std::ops::DerefMut for StateScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        *self.state = self.saved.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_restores_on_drop() {
        let mut state = RenderState::default();
        {
            let mut scope = state.scope();
            scope.tone_mapping_enabled = false;
            scope.clear_color = wgpu::Color::WHITE;
            scope.background_attached = false;
            scope.active_target = ActiveTarget::Offscreen(7);
            assert!(!scope.tone_mapping_enabled);
        }
        assert_eq!(state, RenderState::default());
    }

    #[test]
    fn scope_restores_on_early_exit() {
        fn failing(state: &mut RenderState) -> Result<(), ()> {
            let mut scope = state.scope();
            scope.clear_color = wgpu::Color::WHITE;
            Err(())?;
            unreachable!()
        }

        let mut state = RenderState::default();
        let _ = failing(&mut state);
        assert_eq!(state.clear_color, wgpu::Color::BLACK);
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut state = RenderState::default();
        {
            let mut outer = state.scope();
            outer.tone_mapping_enabled = false;
            {
                let mut inner = outer.scope();
                inner.background_attached = false;
            }
            assert!(outer.background_attached);
            assert!(!outer.tone_mapping_enabled);
        }
        assert!(state.tone_mapping_enabled);
    }
}

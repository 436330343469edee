//! Frame plan — the per-frame pass schedule as data.
//!
//! [`FramePlan::build`] validates the frame's preconditions and produces the
//! strictly ordered pass list with tagged-variant draw requests. Draw
//! requests name the material variant to use for their pass; scene objects
//! are never mutated, so every object's bound variants and priority are
//! trivially identical before and after any pass.
//!
//! Pass order is fixed: transmission capture (when triggered) → shadow →
//! main color → post-processing. No skipping, no reordering.

use smallvec::SmallVec;

use crate::errors::FrameError;
use crate::scene::object::PassPriority;
use crate::scene::scene::Scene;

/// Pass stage, in execution order.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum PassStage {
    /// Copy the scene color buffer for transmissive sampling.
    TransmissionCapture = 0,
    /// Render depth variants from the light's viewpoint.
    ShadowMap = 1,
    /// Render color variants to the scene color buffer.
    MainColor = 2,
    /// Antialiasing → bloom → vignette.
    PostProcess = 3,
}

impl PassStage {
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TransmissionCapture => "TransmissionCapture",
            Self::ShadowMap => "ShadowMap",
            Self::MainColor => "MainColor",
            Self::PostProcess => "PostProcess",
        }
    }
}

/// Which of an object's two variants a draw request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantRole {
    Color,
    Depth,
}

/// One draw call of one pass: object index into `Scene::objects` plus the
/// variant selection for this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRequest {
    pub object_index: usize,
    pub role: VariantRole,
    pub priority: PassPriority,
}

/// One scheduled pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDesc {
    pub stage: PassStage,
    pub draws: SmallVec<[DrawRequest; 8]>,
}

/// The frame's full pass schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    passes: SmallVec<[PassDesc; 4]>,
    uses_transmission: bool,
}

impl FramePlan {
    /// Builds the schedule, failing fast on missing preconditions.
    pub fn build(scene: &Scene) -> Result<Self, FrameError> {
        scene.require_light()?;
        scene.require_backdrop()?;

        let mut passes = SmallVec::new();
        let uses_transmission = scene.uses_transmission();

        if uses_transmission {
            passes.push(PassDesc {
                stage: PassStage::TransmissionCapture,
                draws: SmallVec::new(),
            });
        }

        // Shadow pass: depth variants of every shadow-relevant object,
        // backdrop-first like the main pass so priority stays meaningful in
        // the journal.
        let mut shadow_draws: SmallVec<[DrawRequest; 8]> = scene
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.casts_shadow)
            .map(|(object_index, object)| DrawRequest {
                object_index,
                role: VariantRole::Depth,
                priority: object.priority,
            })
            .collect();
        shadow_draws.sort_by_key(|draw| draw.priority);
        passes.push(PassDesc {
            stage: PassStage::ShadowMap,
            draws: shadow_draws,
        });

        // Main color pass: everything, color variants, priority order.
        // The sort is stable; objects of equal priority keep insertion order.
        let mut main_draws: SmallVec<[DrawRequest; 8]> = scene
            .objects
            .iter()
            .enumerate()
            .map(|(object_index, object)| DrawRequest {
                object_index,
                role: VariantRole::Color,
                priority: object.priority,
            })
            .collect();
        main_draws.sort_by_key(|draw| draw.priority);
        passes.push(PassDesc {
            stage: PassStage::MainColor,
            draws: main_draws,
        });

        passes.push(PassDesc {
            stage: PassStage::PostProcess,
            draws: SmallVec::new(),
        });

        Ok(Self {
            passes,
            uses_transmission,
        })
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[PassDesc] {
        &self.passes
    }

    #[inline]
    #[must_use]
    pub fn uses_transmission(&self) -> bool {
        self.uses_transmission
    }

    /// The stage sequence, for order assertions and journals.
    #[must_use]
    pub fn stages(&self) -> Vec<PassStage> {
        self.passes.iter().map(|pass| pass.stage).collect()
    }

    #[must_use]
    pub fn pass(&self, stage: PassStage) -> Option<&PassDesc> {
        self.passes.iter().find(|pass| pass.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordering() {
        assert!(PassStage::TransmissionCapture < PassStage::ShadowMap);
        assert!(PassStage::ShadowMap < PassStage::MainColor);
        assert!(PassStage::MainColor < PassStage::PostProcess);
    }
}

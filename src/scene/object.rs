//! Scene objects and draw ordering.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

use crate::resources::geometry::Mesh;
use crate::resources::material::MaterialVariant;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Named draw-order stage. Lower stages draw first.
///
/// Replaces scattered numeric render-order tags: the compositing order of
/// the main color pass is this enum's ordering, nothing else. `Liquid`
/// (transmissive) draws last so its transmission capture has already seen
/// everything behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PassPriority {
    /// Backdrop geometry (the plane group). Drawn first.
    Background = 0,
    /// Opaque subjects.
    Opaque = 2,
    /// Instanced decoration batches.
    Instanced = 3,
    /// Transmissive subjects. Drawn last.
    Liquid = 4,
}

impl PassPriority {
    /// Numeric order value (used for sorting and logged in pass journals).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Background => "Background",
            Self::Opaque => "Opaque",
            Self::Instanced => "Instanced",
            Self::Liquid => "Liquid",
        }
    }
}

/// A drawable: one mesh plus its color/depth material variant pair.
///
/// The orchestrator never rebinds materials on the object; each draw request
/// names the variant to use for that pass.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: u64,
    label: String,
    pub mesh: Mesh,
    pub color_variant: MaterialVariant,
    pub depth_variant: MaterialVariant,
    pub priority: PassPriority,
    pub casts_shadow: bool,
    pub world: Mat4,
}

impl SceneObject {
    #[must_use]
    pub fn new(
        label: &str,
        mesh: Mesh,
        color_variant: MaterialVariant,
        depth_variant: MaterialVariant,
        priority: PassPriority,
    ) -> Self {
        Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            mesh,
            color_variant,
            depth_variant,
            priority,
            casts_shadow: true,
            world: Mat4::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    #[must_use]
    pub fn with_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn uses_transmission(&self) -> bool {
        self.color_variant.uses_transmission()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering() {
        assert!(PassPriority::Background < PassPriority::Opaque);
        assert!(PassPriority::Opaque < PassPriority::Instanced);
        assert!(PassPriority::Instanced < PassPriority::Liquid);
    }
}

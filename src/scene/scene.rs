//! Scene container.

use glam::{Mat4, Vec3};

use crate::errors::FrameError;
use crate::resources::texture::EnvironmentMap;
use crate::scene::light::DirectionalLight;
use crate::scene::object::{PassPriority, SceneObject};

/// Perspective camera for the main color pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            fov_y: 70.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        proj * view
    }
}

/// Everything the orchestrator consumes each frame.
///
/// The transform hierarchy, asset loading, and UI live elsewhere; a scene
/// holds resolved world transforms and resource handles only.
#[derive(Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub light: Option<DirectionalLight>,
    pub environment: Option<EnvironmentMap>,
    pub camera: Camera,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: SceneObject) -> u64 {
        let id = object.id();
        self.objects.push(object);
        id
    }

    #[must_use]
    pub fn object(&self, id: u64) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    /// The light, or the fail-fast error the orchestrator surfaces.
    pub fn require_light(&self) -> Result<&DirectionalLight, FrameError> {
        self.light.as_ref().ok_or(FrameError::MissingLight)
    }

    /// The backdrop object (lowest-priority group), or the fail-fast error.
    ///
    /// A frame without its backdrop would still "succeed" visually corrupt;
    /// the orchestrator aborts instead.
    pub fn require_backdrop(&self) -> Result<&SceneObject, FrameError> {
        self.objects
            .iter()
            .find(|object| object.priority == PassPriority::Background)
            .ok_or(FrameError::MissingObject { role: "backdrop plane" })
    }

    /// True when any object needs the transmission capture pass.
    #[must_use]
    pub fn uses_transmission(&self) -> bool {
        self.objects.iter().any(SceneObject::uses_transmission)
    }
}

//! Directional light and its shadow camera.

use glam::{Mat4, Vec3};

/// Fixed orthographic shadow frustum configuration.
///
/// The light acts as a camera during the shadow pass; these bounds define
/// its projection. They are configuration, not per-frame state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrustum {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    /// Shadow color target resolution (square).
    pub map_size: u32,
    pub bias: f32,
}

impl Default for ShadowFrustum {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            left: -30.0,
            right: 30.0,
            top: 30.0,
            bottom: -30.0,
            map_size: 1024,
            bias: 0.0001,
        }
    }
}

/// The scene's single directional light.
///
/// Direction is defined by a fixed target point, not stored directly.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub frustum: ShadowFrustum,
}

impl DirectionalLight {
    #[must_use]
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            color: Vec3::ONE,
            intensity: 1.0,
            frustum: ShadowFrustum::default(),
        }
    }

    /// Unit vector from position toward the target point.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() > 1e-6 {
            dir.normalize()
        } else {
            -Vec3::Z
        }
    }

    /// View matrix of the light camera.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        let dir = self.direction();
        let up = if dir.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    /// Orthographic projection of the light camera.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let f = &self.frustum;
        Mat4::orthographic_rh(f.left, f.right, f.bottom, f.top, f.near, f.far)
    }

    /// Combined view-projection used by the shadow pass and by shadow
    /// sampling in the main pass.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_points_at_target() {
        let light = DirectionalLight::new(Vec3::new(10.0, 10.0, 10.0), Vec3::ZERO);
        let dir = light.direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.x < 0.0 && dir.y < 0.0 && dir.z < 0.0);
    }

    #[test]
    fn view_projection_is_invertible() {
        let light = DirectionalLight::new(Vec3::new(10.0, 10.0, 10.0), Vec3::ZERO);
        let vp = light.view_projection();
        assert!(vp.determinant().abs() > 1e-10);
    }

    #[test]
    fn target_inside_frustum_maps_into_clip_box() {
        let light = DirectionalLight::new(Vec3::new(10.0, 10.0, 10.0), Vec3::ZERO);
        let clip = light.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!(ndc.z >= 0.0 && ndc.z <= 1.0);
    }
}

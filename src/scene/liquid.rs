//! Liquid surface dynamics.
//!
//! Velocity-driven wobble with exponential recovery: object motion adds
//! clamped wobble energy; each step the stored amounts decay toward zero and
//! a sine pulse turns them into the instantaneous surface tilt fed to the
//! liquid shading family (`wobble_x`, `wobble_z`, `fill_height`).

use glam::Vec3;

fn lerp(start: f32, end: f32, amount: f32) -> f32 {
    (1.0 - amount) * start + amount * end
}

/// Tunable liquid parameters (fed from the control surface).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidParams {
    /// Fill level offset in object space.
    pub fill_amount: f32,
    /// Wobble decay rate per second.
    pub recovery: f32,
    /// Sine pulse frequency factor.
    pub wobble_speed: f32,
    /// Per-step wobble clamp.
    pub max_wobble: f32,
}

impl Default for LiquidParams {
    fn default() -> Self {
        Self {
            fill_amount: -0.25,
            recovery: 10.0,
            wobble_speed: 2.0,
            max_wobble: 0.2,
        }
    }
}

/// Output of one dynamics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidSurface {
    pub fill_height: f32,
    pub wobble_x: f32,
    pub wobble_z: f32,
}

/// Stateful wobble integrator for one liquid object.
#[derive(Debug, Default)]
pub struct LiquidDynamics {
    wobble_add_x: f32,
    wobble_add_z: f32,
    last_position: Vec3,
    last_rotation: Vec3,
    time: f32,
}

impl LiquidDynamics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the simulation by `dt` given the object's current world
    /// position and euler rotation.
    pub fn step(
        &mut self,
        params: &LiquidParams,
        position: Vec3,
        rotation: Vec3,
        dt: f32,
    ) -> LiquidSurface {
        self.time += dt;

        // decrease wobble over time
        let decreasing = dt * params.recovery;
        self.wobble_add_x = lerp(self.wobble_add_x, 0.0, decreasing.clamp(0.0, 1.0));
        self.wobble_add_z = lerp(self.wobble_add_z, 0.0, decreasing.clamp(0.0, 1.0));

        // make a sine wave of the decreasing wobble
        let pulse = 2.0 * std::f32::consts::PI * params.wobble_speed;
        let wobble_x = self.wobble_add_x * (pulse * self.time).sin();
        let wobble_z = self.wobble_add_z * (pulse * self.time).sin();

        if dt > 0.0 {
            let velocity = (self.last_position - position) / dt;
            let angular = (rotation - self.last_rotation) / dt;

            self.wobble_add_x += ((velocity.x + angular.z * 0.2) * params.max_wobble)
                .clamp(-params.max_wobble, params.max_wobble);
            self.wobble_add_z += ((velocity.z + angular.x * 0.2) * params.max_wobble)
                .clamp(-params.max_wobble, params.max_wobble);
        }

        self.last_position = position;
        self.last_rotation = rotation;

        LiquidSurface {
            fill_height: -position.y - params.fill_amount,
            wobble_x,
            wobble_z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wobble_decays_when_still() {
        let mut dynamics = LiquidDynamics::new();
        let params = LiquidParams::default();

        // kick it once
        dynamics.step(&params, Vec3::ZERO, Vec3::ZERO, 1.0 / 60.0);
        dynamics.step(&params, Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0 / 60.0);
        let energetic = dynamics.wobble_add_x.abs();
        assert!(energetic > 0.0);

        // then hold still for a while
        for _ in 0..120 {
            dynamics.step(&params, Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0 / 60.0);
        }
        assert!(dynamics.wobble_add_x.abs() < energetic * 0.05);
    }

    #[test]
    fn wobble_energy_is_clamped_per_step() {
        let mut dynamics = LiquidDynamics::new();
        let params = LiquidParams::default();
        dynamics.step(&params, Vec3::ZERO, Vec3::ZERO, 1.0 / 60.0);
        // extreme jump still only adds max_wobble once
        dynamics.step(&params, Vec3::new(1000.0, 0.0, 0.0), Vec3::ZERO, 1.0 / 60.0);
        assert!(dynamics.wobble_add_x.abs() <= params.max_wobble + 1e-6);
    }

    #[test]
    fn fill_height_tracks_world_height() {
        let mut dynamics = LiquidDynamics::new();
        let params = LiquidParams::default();
        let surface = dynamics.step(&params, Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, 0.016);
        assert!((surface.fill_height - (-2.0 - params.fill_amount)).abs() < 1e-6);
    }
}

//! Environment lighting provider.
//!
//! Projects an environment map onto the 2nd-order spherical-harmonic basis
//! (9 color coefficients) and combines the result with the directional light
//! transform into the per-frame [`LightingState`].
//!
//! Projection is event-driven, not per-frame: the coefficient set is cached
//! by map **identity** and recomputed only when a different map is supplied.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::resources::texture::{CubeFace, CubeMap, EnvironmentMap, Panorama};
use crate::scene::light::DirectionalLight;

/// Nine 2nd-order SH color coefficients.
pub type ShCoefficients = [Vec3; 9];

/// Per-frame lighting inputs, passed explicitly to the uniform sync step.
///
/// There is no ambient global "current light"; the orchestrator owns one of
/// these and hands it to whoever needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingState {
    pub position: Vec3,
    pub direction: Vec3,
    /// Light-camera view-projection (shadow pass + shadow sampling).
    pub view_projection: Mat4,
    pub sh: ShCoefficients,
}

impl LightingState {
    #[must_use]
    pub fn new(light: &DirectionalLight, sh: ShCoefficients) -> Self {
        Self {
            position: light.position,
            direction: light.direction(),
            view_projection: light.view_projection(),
            sh,
        }
    }
}

/// Derives and caches ambient-lighting coefficients from environment maps.
#[derive(Debug, Default)]
pub struct LightingProvider {
    cache: Option<(u64, ShCoefficients)>,
    recompute_count: u64,
}

impl LightingProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the SH coefficient set for `env`, projecting only when the
    /// map identity differs from the cached one.
    pub fn derive_lighting(&mut self, env: &EnvironmentMap) -> ShCoefficients {
        let id = env.id();
        if let Some((cached_id, sh)) = &self.cache
            && *cached_id == id
        {
            return *sh;
        }

        let sh = match env {
            EnvironmentMap::Cube(cube) => project_cube(cube),
            EnvironmentMap::Equirect(pano) => project_equirect(pano),
        };
        self.recompute_count += 1;
        log::debug!("SH coefficients re-derived for environment map {id}");
        self.cache = Some((id, sh));
        sh
    }

    /// Builds the frame's lighting state from the light and the environment.
    pub fn lighting_state(
        &mut self,
        light: &DirectionalLight,
        env: &EnvironmentMap,
    ) -> LightingState {
        let sh = self.derive_lighting(env);
        LightingState::new(light, sh)
    }

    /// Number of projections actually performed (cache misses).
    #[inline]
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }
}

// ============================================================================
// SH projection
// ============================================================================

/// Evaluates the real 2nd-order SH basis at a unit direction.
#[must_use]
pub fn sh_basis(dir: Vec3) -> [f32; 9] {
    let (x, y, z) = (dir.x, dir.y, dir.z);
    [
        0.282_095,
        0.488_603 * y,
        0.488_603 * z,
        0.488_603 * x,
        1.092_548 * x * y,
        1.092_548 * y * z,
        0.315_392 * (3.0 * z * z - 1.0),
        1.092_548 * x * z,
        0.546_274 * (x * x - y * y),
    ]
}

fn project_cube(cube: &CubeMap) -> ShCoefficients {
    let size = cube.size();
    let mut sh = [Vec3::ZERO; 9];
    let mut total_weight = 0.0_f32;

    for face in CubeFace::ALL {
        for row in 0..size {
            for col in 0..size {
                let u = (col as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let v = (row as f32 + 0.5) / size as f32 * 2.0 - 1.0;

                // Texel solid angle ~ 4 / (|d|^3), d = unnormalized direction
                let length_sq = u * u + v * v + 1.0;
                let weight = 4.0 / (length_sq.sqrt() * length_sq);

                let dir = face.direction(u, v);
                let basis = sh_basis(dir);
                let color = cube.texel(face, col, row);

                for (coeff, b) in sh.iter_mut().zip(basis) {
                    *coeff += color * b * weight;
                }
                total_weight += weight;
            }
        }
    }

    normalize(&mut sh, total_weight);
    sh
}

fn project_equirect(pano: &Panorama) -> ShCoefficients {
    let (width, height) = (pano.width(), pano.height());
    let mut sh = [Vec3::ZERO; 9];
    let mut total_weight = 0.0_f32;

    for row in 0..height {
        // phi: polar angle from +Y; texel rows cover [0, pi]
        let phi = (row as f32 + 0.5) / height as f32 * PI;
        let sin_phi = phi.sin();

        for col in 0..width {
            let theta = (col as f32 + 0.5) / width as f32 * 2.0 * PI;

            let dir = Vec3::new(
                sin_phi * theta.sin(),
                phi.cos(),
                sin_phi * theta.cos(),
            );
            let weight = sin_phi;
            let basis = sh_basis(dir);
            let color = pano.texel(col, row);

            for (coeff, b) in sh.iter_mut().zip(basis) {
                *coeff += color * b * weight;
            }
            total_weight += weight;
        }
    }

    normalize(&mut sh, total_weight);
    sh
}

fn normalize(sh: &mut ShCoefficients, total_weight: f32) {
    if total_weight > 0.0 {
        let norm = 4.0 * PI / total_weight;
        for coeff in sh.iter_mut() {
            *coeff *= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_dc_term_is_constant() {
        let a = sh_basis(Vec3::X);
        let b = sh_basis(Vec3::new(0.3, -0.8, 0.52).normalize());
        assert_eq!(a[0], b[0]);
    }

    #[test]
    fn constant_cube_projects_to_dc_dominant_set() {
        let cube = CubeMap::solid(16, Vec3::splat(1.0));
        let sh = project_cube(&cube);

        // DC term of a unit-radiance sphere: 4π * Y00 / (4π) scaling folds
        // into ~ Y00 * 4π after normalization.
        assert!(sh[0].x > 3.0 && sh[0].x < 4.0, "dc = {:?}", sh[0]);
        for coeff in &sh[1..] {
            assert!(coeff.length() < 0.05, "band >0 should vanish: {coeff:?}");
        }
    }

    #[test]
    fn gradient_cube_has_linear_y_band() {
        let cube = CubeMap::gradient(16, Vec3::ONE, Vec3::ZERO);
        let sh = project_cube(&cube);
        // sky above, dark below → positive Y-linear coefficient
        assert!(sh[1].x > 0.1, "expected y band, got {:?}", sh[1]);
    }
}

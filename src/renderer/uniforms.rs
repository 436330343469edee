//! GPU uniform data layouts.
//!
//! `#[repr(C)]` Pod mirrors of the WGSL uniform structs, with explicit
//! padding where WGSL packing demands it. The `pack_*` functions bridge the
//! dynamic [`UniformStore`] contract into these fixed layouts, once per
//! frame. Field order must match `shaders/shading.wgsl` exactly; the
//! alignment tests below guard the layout.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::resources::uniform_store::UniformStore;

/// Per-frame globals (camera, light camera, viewport).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniforms {
    pub view_projection: Mat4,
    pub light_view_projection: Mat4,
    pub camera_position: Vec3,
    pub time: f32,
    pub viewport_size: Vec2,
    pub shadow_texel: Vec2,
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            light_view_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            time: 0.0,
            viewport_size: Vec2::ONE,
            shadow_texel: Vec2::ZERO,
        }
    }
}

/// The full shading contract, packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadingUniforms {
    pub sh: [Vec4; 9],

    pub sheen_color: Vec3,
    pub sheen: f32,

    pub glitter_color: Vec3,
    pub glitter: f32,

    pub light_position: Vec3,
    pub glitter_density: f32,

    pub light_direction: Vec3,
    pub reflectance: f32,

    pub ambient_light: Vec3,
    pub direct_intensity: f32,

    pub normal_repeat: Vec2,
    pub blue_noise_texel: Vec2,

    pub env_texture_size: Vec2,
    pub transmission_sampler_size: Vec2,

    pub indirect_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,

    pub clearcoat_roughness: f32,
    pub sheen_roughness: f32,
    pub normal_scale: f32,
    pub transmission: f32,

    pub ior: f32,
    pub thickness: f32,
    pub time: f32,
    pub delta_time: f32,

    pub super_rough: u32,
    pub fill_height: f32,
    pub wobble_x: f32,
    pub wobble_z: f32,
}

/// The reduced shadow-shading contract, packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct DepthUniforms {
    pub light_position: Vec3,
    pub opacity: f32,
    pub time: f32,
    pub(crate) __pad: [f32; 3],
}

/// Per-object data (dynamic-offset buffer).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelUniforms {
    pub world: Mat4,
    pub base_color: Vec4,
}

/// Light-camera uniforms for the shadow pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub view_projection: Mat4,
    pub position: Vec3,
    pub time: f32,
}

// ============================================================================
// Store → packed
// ============================================================================

fn vec4_sh(store: &UniformStore) -> [Vec4; 9] {
    let mut sh = [Vec4::ZERO; 9];
    if let Some(coefficients) = store.get("sh_coefficients").and_then(|v| v.as_vec3_array()) {
        for (out, coeff) in sh.iter_mut().zip(coefficients) {
            *out = coeff.extend(0.0);
        }
    }
    sh
}

/// Packs the color-contract store into [`ShadingUniforms`].
///
/// Missing slots resolve to the contract defaults; the store is the source
/// of truth and is expected to carry the full contract.
#[must_use]
pub fn pack_shading(store: &UniformStore) -> ShadingUniforms {
    let vec2_or = |name: &str, default: Vec2| {
        store
            .get(name)
            .and_then(crate::resources::uniform_store::UniformValue::as_vec2)
            .unwrap_or(default)
    };

    ShadingUniforms {
        sh: vec4_sh(store),

        sheen_color: store.vec3_or("sheen_color", Vec3::ZERO),
        sheen: store.float_or("sheen", 0.0),

        glitter_color: store.vec3_or("glitter_color", Vec3::ZERO),
        glitter: store.float_or("glitter", 0.0),

        light_position: store.vec3_or("light_position", Vec3::ZERO),
        glitter_density: store.float_or("glitter_density", 1.0),

        light_direction: store.vec3_or("light_direction", Vec3::NEG_Z),
        reflectance: store.float_or("reflectance", 0.5),

        ambient_light: store.vec3_or("ambient_light", Vec3::ZERO),
        direct_intensity: store.float_or("direct_intensity", 2.0),

        normal_repeat: vec2_or("normal_repeat_factor", Vec2::ONE),
        blue_noise_texel: vec2_or("blue_noise_texel_size", Vec2::ZERO),

        env_texture_size: vec2_or("env_texture_size", Vec2::ZERO),
        transmission_sampler_size: vec2_or("transmission_sampler_size", Vec2::splat(1024.0)),

        indirect_intensity: store.float_or("indirect_intensity", 0.8),
        roughness: store.float_or("roughness", 0.5),
        metalness: store.float_or("metalness", 0.5),
        clearcoat: store.float_or("clearcoat", 0.0),

        clearcoat_roughness: store.float_or("clearcoat_roughness", 0.0),
        sheen_roughness: store.float_or("sheen_roughness", 0.0),
        normal_scale: store.float_or("normal_scale", 0.0),
        transmission: store.float_or("transmission", 0.0),

        ior: store.float_or("ior", 1.0),
        thickness: store.float_or("thickness", 0.0),
        time: store.float_or("time", 0.0),
        delta_time: store.float_or("delta_time", 0.0),

        super_rough: u32::from(
            store
                .get("super_rough")
                .and_then(crate::resources::uniform_store::UniformValue::as_bool)
                .unwrap_or(false),
        ),
        fill_height: store.float_or("fill_height", 0.0),
        wobble_x: store.float_or("wobble_x", 0.0),
        wobble_z: store.float_or("wobble_z", 0.0),
    }
}

/// Packs the depth-contract store into [`DepthUniforms`].
#[must_use]
pub fn pack_depth(store: &UniformStore) -> DepthUniforms {
    DepthUniforms {
        light_position: store.vec3_or("light_position", Vec3::ZERO),
        opacity: store.float_or("opacity", 0.0),
        time: store.float_or("time", 0.0),
        __pad: [0.0; 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn uniform_structs_are_16_byte_aligned() {
        assert_eq!(mem::size_of::<GlobalUniforms>() % 16, 0);
        assert_eq!(mem::size_of::<ShadingUniforms>() % 16, 0);
        assert_eq!(mem::size_of::<DepthUniforms>() % 16, 0);
        assert_eq!(mem::size_of::<ModelUniforms>() % 16, 0);
        assert_eq!(mem::size_of::<LightUniforms>() % 16, 0);
    }

    #[test]
    fn shading_uniforms_match_wgsl_size() {
        // 9 vec4 + 11 x 16-byte rows
        assert_eq!(mem::size_of::<ShadingUniforms>(), 144 + 11 * 16);
    }

    #[test]
    fn pack_reads_contract_slots() {
        let mut store = crate::resources::material::color_contract("test");
        store.set_float("roughness", 0.25).unwrap();
        store.set_bool("super_rough", true).unwrap();
        let packed = pack_shading(&store);
        assert_eq!(packed.roughness, 0.25);
        assert_eq!(packed.super_rough, 1);
    }
}

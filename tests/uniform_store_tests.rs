//! Uniform Store Tests
//!
//! Tests for:
//! - Solid / liquid store isolation
//! - Merge semantics (union, overrides win, fresh identity)
//! - Type-checked writes
//! - Contract completeness for the packing step

use glam::Vec3;

use lustre::resources::material::{MaterialFamily, color_contract, depth_contract};
use lustre::resources::uniform_store::{UniformStore, UniformValue};
use lustre::FrameError;

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn liquid_writes_never_touch_the_solid_store() {
    let solid = MaterialFamily::new("solid");
    let liquid = MaterialFamily::new("liquid");

    {
        let mut solid_store = solid.color_store.write();
        solid_store.set_float("roughness", 0.15).unwrap();
        solid_store.set_float("transmission", 0.0).unwrap();
        solid_store.set_color("sheen_color", Vec3::X).unwrap();
    }

    // Mutate every slot the liquid family owns.
    {
        let mut liquid_store = liquid.color_store.write();
        liquid_store.set_float("roughness", 1.0).unwrap();
        liquid_store.set_float("transmission", 1.0).unwrap();
        liquid_store.set_color("sheen_color", Vec3::Y).unwrap();
        liquid_store.set_float("fill_height", 0.7).unwrap();
    }

    let solid_store = solid.color_store.read();
    assert_eq!(solid_store.float_or("roughness", -1.0), 0.15);
    assert_eq!(solid_store.float_or("transmission", -1.0), 0.0);
    assert_eq!(solid_store.vec3_or("sheen_color", Vec3::ZERO), Vec3::X);
    assert_eq!(solid_store.float_or("fill_height", -1.0), 0.0);
}

#[test]
fn stores_have_distinct_identities_and_versions() {
    let solid = MaterialFamily::new("solid");
    let liquid = MaterialFamily::new("liquid");

    assert_ne!(solid.color_store.read().id(), liquid.color_store.read().id());

    let solid_before = solid.color_store.read().version();
    liquid.color_store.write().set_float("roughness", 0.3).unwrap();
    assert_eq!(solid.color_store.read().version(), solid_before);
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn merge_is_union_with_override_priority() {
    let base = color_contract("base");

    let mut overrides = UniformStore::new("overrides");
    overrides
        .declare("roughness", UniformValue::Float(0.9))
        .declare("custom_slot", UniformValue::Float(7.0));

    let merged = UniformStore::merge(&base, &overrides);

    assert_eq!(merged.float_or("roughness", -1.0), 0.9, "override wins");
    assert_eq!(merged.float_or("custom_slot", -1.0), 7.0, "override-only slot kept");
    assert_eq!(merged.float_or("ior", -1.0), 1.0, "base-only slot kept");
    assert_eq!(merged.len(), base.len() + 1);
}

// ============================================================================
// Typed writes
// ============================================================================

#[test]
fn unknown_and_mistyped_writes_are_rejected() {
    let mut store = depth_contract("depth");

    assert!(matches!(
        store.set_float("sheen", 1.0).unwrap_err(),
        FrameError::UnknownUniform { .. }
    ));
    assert!(matches!(
        store.set("opacity", UniformValue::Bool(true)).unwrap_err(),
        FrameError::UniformTypeMismatch { .. }
    ));

    // Failed writes leave value and version untouched.
    assert_eq!(store.float_or("opacity", -1.0), 0.0);
}

#[test]
fn texture_slots_hold_handles_not_copies() {
    let mut store = color_contract("tex");
    // Unbinding writes None; the slot stays texture-typed.
    store.set("normal_texture", UniformValue::Texture(None)).unwrap();
    assert!(matches!(
        store.set("normal_texture", UniformValue::Float(1.0)).unwrap_err(),
        FrameError::UniformTypeMismatch { .. }
    ));
}

// ============================================================================
// Contract shape
// ============================================================================

#[test]
fn color_contract_carries_the_full_shading_surface() {
    let store = color_contract("solid");
    for slot in [
        "time",
        "delta_time",
        "reflectance",
        "direct_intensity",
        "indirect_intensity",
        "super_rough",
        "roughness",
        "metalness",
        "clearcoat",
        "clearcoat_roughness",
        "sheen",
        "sheen_roughness",
        "sheen_color",
        "light_position",
        "light_direction",
        "sh_coefficients",
        "glitter",
        "glitter_density",
        "glitter_color",
        "normal_scale",
        "normal_repeat_factor",
        "transmission",
        "ior",
        "thickness",
        "transmission_sampler_map",
        "fill_height",
        "wobble_x",
        "wobble_z",
    ] {
        assert!(store.contains(slot), "missing contract slot {slot}");
    }

    // SH is exactly the 9-coefficient set.
    let sh = store.get("sh_coefficients").unwrap().as_vec3_array().unwrap();
    assert_eq!(sh.len(), 9);
}

#[test]
fn depth_contract_is_the_reduced_subset() {
    let store = depth_contract("depth");
    assert!(store.contains("light_position"));
    assert!(store.contains("opacity"));
    assert!(store.contains("time"));
    assert!(!store.contains("roughness"));
    assert!(!store.contains("sh_coefficients"));
}

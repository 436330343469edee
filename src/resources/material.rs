//! Material variants and the shading uniform contracts.
//!
//! A renderable binds two [`MaterialVariant`]s: a **color** variant running
//! the full shading model and a **depth** variant running the reduced
//! shadow-map shading. Variants are created once at scene construction and
//! mutated only through their uniform store.
//!
//! Pipeline caching is keyed by [`MaterialKey`] — the feature-flag set plus
//! the uniform-store identity and variant kind. Nothing here is randomized;
//! two variants with identical keys may share a pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use glam::{Vec2, Vec3};

use crate::resources::uniform_store::{
    SharedUniformStore, UniformStore, UniformValue, share,
};

static NEXT_VARIANT_ID: AtomicU64 = AtomicU64::new(1);

bitflags! {
    /// Compile-time shading feature flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFeatures: u32 {
        const ENV_MAP      = 1 << 0;
        const NORMAL_MAP   = 1 << 1;
        const BASE_MAP     = 1 << 2;
        const TRANSMISSION = 1 << 3;
        const GLITTER      = 1 << 4;
        const LIQUID       = 1 << 5;
    }
}

/// Which shading program a variant runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Full shading model (diffuse/specular/sheen/clearcoat/transmission…).
    Color,
    /// Reduced shadow/depth shading: light position, base color, opacity.
    Depth,
}

/// Semantic pipeline-cache key for a material variant.
///
/// Replaces per-instance random keys: recompilation happens exactly when a
/// semantic input changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    pub kind: VariantKind,
    pub features: MaterialFeatures,
    pub store_id: u64,
}

#[derive(Debug)]
struct VariantInner {
    id: u64,
    label: String,
    kind: VariantKind,
    features: MaterialFeatures,
    store: SharedUniformStore,
    base_color: Vec3,
}

/// A named shading program bound to one uniform store and a feature set.
///
/// Cheap to clone (shared handle). Never destroyed mid-session.
#[derive(Debug, Clone)]
pub struct MaterialVariant(Arc<VariantInner>);

impl MaterialVariant {
    #[must_use]
    pub fn new(
        label: &str,
        kind: VariantKind,
        features: MaterialFeatures,
        store: SharedUniformStore,
        base_color: Vec3,
    ) -> Self {
        Self(Arc::new(VariantInner {
            id: NEXT_VARIANT_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            kind,
            features,
            store,
            base_color,
        }))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> VariantKind {
        self.0.kind
    }

    #[inline]
    #[must_use]
    pub fn features(&self) -> MaterialFeatures {
        self.0.features
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedUniformStore {
        &self.0.store
    }

    /// Per-object tint, outside the shared store so two objects of one
    /// family can differ in color while sharing every other parameter.
    #[inline]
    #[must_use]
    pub fn base_color(&self) -> Vec3 {
        self.0.base_color
    }

    /// Cache key: feature flags + store identity + kind.
    #[must_use]
    pub fn key(&self) -> MaterialKey {
        MaterialKey {
            kind: self.0.kind,
            features: self.0.features,
            store_id: self.0.store.read().id(),
        }
    }

    #[must_use]
    pub fn uses_transmission(&self) -> bool {
        self.0.features.contains(MaterialFeatures::TRANSMISSION)
    }
}

impl PartialEq for MaterialVariant {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for MaterialVariant {}

// ============================================================================
// Uniform contracts
// ============================================================================
//
// Slot names below are the fixed contract the shading programs consume.
// The orchestrator writes every per-frame slot exactly once per frame.

/// Builds the full-shading uniform contract with its defaults.
#[must_use]
pub fn color_contract(label: &str) -> UniformStore {
    let mut store = UniformStore::new(label);
    store
        .declare("time", UniformValue::Float(0.0))
        .declare("delta_time", UniformValue::Float(0.0))
        // Base lobes
        .declare("reflectance", UniformValue::Float(0.5))
        .declare("direct_intensity", UniformValue::Float(2.0))
        .declare("indirect_intensity", UniformValue::Float(0.8))
        .declare("super_rough", UniformValue::Bool(false))
        .declare("roughness", UniformValue::Float(0.5))
        .declare("metalness", UniformValue::Float(0.5))
        // Clearcoat
        .declare("clearcoat", UniformValue::Float(0.0))
        .declare("clearcoat_roughness", UniformValue::Float(0.0))
        // Sheen
        .declare("sheen", UniformValue::Float(0.0))
        .declare("sheen_roughness", UniformValue::Float(0.0))
        .declare("sheen_color", UniformValue::Color(Vec3::ZERO))
        // Lighting (written by the orchestrator from LightingState)
        .declare("ambient_light", UniformValue::Vec3(Vec3::ZERO))
        .declare("light_direction", UniformValue::Vec3(Vec3::NEG_Z))
        .declare("light_position", UniformValue::Vec3(Vec3::ZERO))
        .declare("sh_coefficients", UniformValue::Vec3Array(vec![Vec3::ZERO; 9]))
        // Glitter
        .declare("glitter", UniformValue::Float(0.0))
        .declare("glitter_density", UniformValue::Float(1.0))
        .declare("glitter_color", UniformValue::Color(Vec3::ZERO))
        .declare("glitter_noise_texture", UniformValue::Texture(None))
        // Normal mapping
        .declare("normal_texture", UniformValue::Texture(None))
        .declare("normal_scale", UniformValue::Float(0.0))
        .declare("normal_repeat_factor", UniformValue::Vec2(Vec2::ONE))
        // Dither noise
        .declare("blue_noise_texture", UniformValue::Texture(None))
        .declare("blue_noise_texel_size", UniformValue::Vec2(Vec2::ZERO))
        // Environment
        .declare("env_texture", UniformValue::Texture(None))
        .declare("env_texture_size", UniformValue::Vec2(Vec2::ZERO))
        // Transmission
        .declare("transmission", UniformValue::Float(0.0))
        .declare("ior", UniformValue::Float(1.0))
        .declare("thickness", UniformValue::Float(0.0))
        .declare("transmission_sampler_size", UniformValue::Vec2(Vec2::new(1024.0, 1024.0)))
        .declare("transmission_sampler_map", UniformValue::Texture(None))
        // Liquid surface state (zero for non-liquid families)
        .declare("fill_height", UniformValue::Float(0.0))
        .declare("wobble_x", UniformValue::Float(0.0))
        .declare("wobble_z", UniformValue::Float(0.0));
    store
}

/// Builds the reduced shadow/depth uniform contract.
#[must_use]
pub fn depth_contract(label: &str) -> UniformStore {
    let mut store = UniformStore::new(label);
    store
        .declare("light_position", UniformValue::Vec3(Vec3::ZERO))
        .declare("opacity", UniformValue::Float(0.0))
        .declare("time", UniformValue::Float(0.0));
    store
}

/// A material family: one color store + one depth store, shared by every
/// variant of the family.
#[derive(Debug, Clone)]
pub struct MaterialFamily {
    pub color_store: SharedUniformStore,
    pub depth_store: SharedUniformStore,
}

impl MaterialFamily {
    /// Creates a family with fresh contract stores.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            color_store: share(color_contract(&format!("{label}.color"))),
            depth_store: share(depth_contract(&format!("{label}.depth"))),
        }
    }

    /// Creates the color/depth variant pair for one renderable.
    #[must_use]
    pub fn variants(
        &self,
        label: &str,
        features: MaterialFeatures,
        base_color: Vec3,
    ) -> (MaterialVariant, MaterialVariant) {
        let color = MaterialVariant::new(
            label,
            VariantKind::Color,
            features,
            Arc::clone(&self.color_store),
            base_color,
        );
        let depth = MaterialVariant::new(
            &format!("{label}.depth"),
            VariantKind::Depth,
            features,
            Arc::clone(&self.depth_store),
            base_color,
        );
        (color, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_stores_are_independent() {
        let solid = MaterialFamily::new("solid");
        let liquid = MaterialFamily::new("liquid");

        solid.color_store.write().set_float("roughness", 0.15).unwrap();
        liquid.color_store.write().set_float("roughness", 1.0).unwrap();

        assert_eq!(solid.color_store.read().float_or("roughness", -1.0), 0.15);
        assert_eq!(liquid.color_store.read().float_or("roughness", -1.0), 1.0);
    }

    #[test]
    fn key_changes_with_features_not_randomness() {
        let family = MaterialFamily::new("solid");
        let (a, _) = family.variants("a", MaterialFeatures::ENV_MAP, Vec3::ONE);
        let (b, _) = family.variants("b", MaterialFeatures::ENV_MAP, Vec3::ONE);
        let (c, _) = family.variants(
            "c",
            MaterialFeatures::ENV_MAP | MaterialFeatures::NORMAL_MAP,
            Vec3::ONE,
        );

        // Same family + same features → same pipeline key, even across objects.
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}

//! Uniform Store — 着色参数容器
//!
//! 以扁平的 `name -> typed slot` 映射持有一个材质族的全部着色参数。
//! 每个 slot 的类型在创建时固定，之后只允许同类型赋值。
//!
//! # 设计
//! - 每个 store 拥有唯一 ID（原子计数器），参与管线缓存 key
//! - 版本号随每次写入递增，用于脏检查
//! - `merge` 产生基础集与覆盖集的并集（按名称覆盖）
//! - 纹理 slot 仅持有句柄引用，不拥有纹理资源

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::FrameError;
use crate::resources::texture::TextureHandle;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Semantic type of a uniform slot. Fixed at slot creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Bool,
    Vec2,
    Vec3,
    /// Like [`Vec3`](UniformType::Vec3) but semantically an RGB color.
    Color,
    /// Opaque device-texture handle (may be unbound).
    Texture,
    /// Fixed-length array of vec3 (spherical-harmonic coefficients).
    Vec3Array,
}

impl UniformType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Color => "color",
            Self::Texture => "texture",
            Self::Vec3Array => "vec3-array",
        }
    }
}

/// A uniform slot value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Color(Vec3),
    Texture(Option<TextureHandle>),
    Vec3Array(Vec<Vec3>),
}

impl UniformValue {
    #[must_use]
    pub const fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Bool(_) => UniformType::Bool,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Color(_) => UniformType::Color,
            Self::Texture(_) => UniformType::Texture,
            Self::Vec3Array(_) => UniformType::Vec3Array,
        }
    }

    /// 数值便捷读取，类型不符时返回 None
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) | Self::Color(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_texture(&self) -> Option<&TextureHandle> {
        match self {
            Self::Texture(handle) => handle.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3_array(&self) -> Option<&[Vec3]> {
        match self {
            Self::Vec3Array(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    ty: UniformType,
    value: UniformValue,
}

/// 一个材质族的着色参数集合。
///
/// 两个独立的 store（solid / liquid）互不影响：对其中一个的任何写入
/// 不会改变另一个的任何 slot。
pub struct UniformStore {
    id: u64,
    label: String,
    slots: FxHashMap<String, Slot>,
    version: u64,
}

impl UniformStore {
    /// 创建空 store
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            slots: FxHashMap::default(),
            version: 0,
        }
    }

    /// 声明一个 slot。类型由初值决定，之后不可变更。
    ///
    /// 重复声明同名 slot 会覆盖初值（类型也随之重置）——仅用于
    /// 构造期；帧循环中一律走 [`set`](Self::set)。
    pub fn declare(&mut self, name: &str, value: UniformValue) -> &mut Self {
        self.slots.insert(
            name.to_string(),
            Slot {
                ty: value.ty(),
                value,
            },
        );
        self
    }

    /// Reads a slot value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    /// Writes a slot value by name.
    ///
    /// Fails without mutating anything when the name is unknown or the value
    /// type does not match the slot's declared type. `Vec3` and `Color` are
    /// interchangeable on write (both are three floats; the slot keeps its
    /// declared semantic).
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), FrameError> {
        let Some(slot) = self.slots.get_mut(name) else {
            return Err(FrameError::UnknownUniform {
                name: name.to_string(),
            });
        };

        let compatible = slot.ty == value.ty()
            || matches!(
                (slot.ty, value.ty()),
                (UniformType::Vec3, UniformType::Color) | (UniformType::Color, UniformType::Vec3)
            );
        if !compatible {
            return Err(FrameError::UniformTypeMismatch {
                name: name.to_string(),
                expected: slot.ty.name(),
                got: value.ty().name(),
            });
        }

        slot.value = value;
        self.version += 1;
        Ok(())
    }

    // === 常用类型的便捷写入 ===

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), FrameError> {
        self.set(name, UniformValue::Float(value))
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<(), FrameError> {
        self.set(name, UniformValue::Bool(value))
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) -> Result<(), FrameError> {
        self.set(name, UniformValue::Vec2(value))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<(), FrameError> {
        self.set(name, UniformValue::Vec3(value))
    }

    pub fn set_color(&mut self, name: &str, value: Vec3) -> Result<(), FrameError> {
        self.set(name, UniformValue::Color(value))
    }

    pub fn set_texture(&mut self, name: &str, handle: Option<TextureHandle>) -> Result<(), FrameError> {
        self.set(name, UniformValue::Texture(handle))
    }

    /// 读取 float slot，不存在或类型不符时回落到默认值
    #[must_use]
    pub fn float_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).and_then(UniformValue::as_float).unwrap_or(default)
    }

    #[must_use]
    pub fn vec3_or(&self, name: &str, default: Vec3) -> Vec3 {
        self.get(name).and_then(UniformValue::as_vec3).unwrap_or(default)
    }

    /// Produces a new store whose slots are the union of `base` and
    /// `overrides`; entries from `overrides` replace base entries by name.
    ///
    /// The result gets a fresh id and version 0.
    #[must_use]
    pub fn merge(base: &UniformStore, overrides: &UniformStore) -> UniformStore {
        let mut slots = base.slots.clone();
        for (name, slot) in &overrides.slots {
            slots.insert(name.clone(), slot.clone());
        }
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            label: overrides.label.clone(),
            slots,
            version: 0,
        }
    }

    /// Unique identity of this store (participates in pipeline-cache keys).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mutation counter. Bumped once per successful [`set`](Self::set).
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

impl fmt::Debug for UniformStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformStore")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("slots", &self.slots.len())
            .field("version", &self.version)
            .finish()
    }
}

/// Shared handle to a [`UniformStore`].
///
/// The orchestrator and all material variants of one family reference the
/// same store through this handle. The render model is single-threaded and
/// frame-synchronous; the lock only arbitrates orchestrator vs. material
/// reads within one frame.
pub type SharedUniformStore = Arc<RwLock<UniformStore>>;

/// Wraps a store into a shared handle.
#[must_use]
pub fn share(store: UniformStore) -> SharedUniformStore {
    Arc::new(RwLock::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_unknown_slot_is_rejected() {
        let mut store = UniformStore::new("test");
        let err = store.set_float("nope", 1.0).unwrap_err();
        assert!(matches!(err, FrameError::UnknownUniform { .. }));
    }

    #[test]
    fn set_wrong_type_is_rejected_without_mutation() {
        let mut store = UniformStore::new("test");
        store.declare("roughness", UniformValue::Float(0.5));
        let before = store.version();
        let err = store.set("roughness", UniformValue::Bool(true)).unwrap_err();
        assert!(matches!(err, FrameError::UniformTypeMismatch { .. }));
        assert_eq!(store.version(), before);
        assert_eq!(store.get("roughness").unwrap().as_float(), Some(0.5));
    }

    #[test]
    fn color_and_vec3_interchange_on_write() {
        let mut store = UniformStore::new("test");
        store.declare("sheen_color", UniformValue::Color(Vec3::ZERO));
        store.set("sheen_color", UniformValue::Vec3(Vec3::ONE)).unwrap();
        assert_eq!(store.get("sheen_color").unwrap().as_vec3(), Some(Vec3::ONE));
    }

    #[test]
    fn merge_overrides_replace_base_by_name() {
        let mut base = UniformStore::new("base");
        base.declare("roughness", UniformValue::Float(0.5))
            .declare("metalness", UniformValue::Float(0.0));

        let mut overrides = UniformStore::new("overrides");
        overrides.declare("roughness", UniformValue::Float(1.0));

        let merged = UniformStore::merge(&base, &overrides);
        assert_eq!(merged.float_or("roughness", -1.0), 1.0);
        assert_eq!(merged.float_or("metalness", -1.0), 0.0);
        assert_ne!(merged.id(), base.id());
    }
}

pub mod geometry;
pub mod material;
pub mod texture;
pub mod uniform_store;

pub use geometry::Mesh;
pub use material::{MaterialFeatures, MaterialKey, MaterialVariant, VariantKind};
pub use texture::{CubeFace, TextureHandle};
pub use uniform_store::{SharedUniformStore, UniformStore, UniformType, UniformValue};

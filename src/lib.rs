#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod controls;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use controls::{ControlPanel, ControlValue};
pub use errors::{FrameError, LustreError, Result};
pub use renderer::{LiquidRig, Renderer, RendererSettings, ShadingRig};
pub use resources::material::MaterialFamily;
pub use resources::{
    MaterialFeatures, MaterialVariant, Mesh, SharedUniformStore, UniformStore, UniformValue,
    VariantKind,
};
pub use scene::{
    Camera, DirectionalLight, EnvironmentMap, LightingProvider, LightingState, PassPriority,
    Scene, SceneObject,
};

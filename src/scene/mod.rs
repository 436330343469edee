pub mod environment;
pub mod light;
pub mod liquid;
pub mod object;
pub mod scene;

pub use environment::{LightingProvider, LightingState, ShCoefficients};
pub use light::{DirectionalLight, ShadowFrustum};
pub use liquid::LiquidDynamics;
pub use object::{PassPriority, SceneObject};
pub use scene::{Camera, Scene};

pub use crate::resources::texture::{CubeMap, EnvironmentMap, Panorama};

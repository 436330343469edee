pub mod forward;
pub mod shadow;
pub mod transmission;

pub use forward::ForwardPass;
pub use shadow::ShadowPass;
pub use transmission::TransmissionCapturePass;

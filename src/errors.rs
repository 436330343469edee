//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! [`LustreError`] covers session-level failures: GPU initialization,
//! render-target allocation, frame aborts. [`FrameError`] covers per-frame
//! precondition violations — these abort the current frame loudly instead of
//! letting a visually-corrupt frame pass as success.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, LustreError>`.

use thiserror::Error;

/// The main error type for the Lustre renderer.
#[derive(Error, Debug)]
pub enum LustreError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Render-target allocation failed. The session cannot proceed without
    /// its fixed target set, so this is fatal at initialization.
    #[error("Failed to allocate {label} render target ({width}x{height})")]
    TargetAllocation {
        /// Debug label of the requested target
        label: &'static str,
        /// Requested width in texels
        width: u32,
        /// Requested height in texels
        height: u32,
    },

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// A frame was aborted because a per-frame precondition failed.
    #[error("Frame aborted: {0}")]
    FrameAborted(#[from] FrameError),
}

/// Per-frame precondition violations.
///
/// These are raised by the frame orchestrator before or during pass
/// execution. A frame that raises one of these produced no output; partial
/// state mutations are rolled back by the scoped restore guards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The scene has no directional light. Light existence is a
    /// precondition of the shadow pass, not an optional feature.
    #[error("Scene has no directional light; the shadow pass cannot run")]
    MissingLight,

    /// A required scene object is absent (e.g. the backdrop plane).
    #[error("Required scene object missing: {role}")]
    MissingObject {
        /// Role the missing object was expected to fill
        role: &'static str,
    },

    /// The single-pass renderer was invoked from within its own execution.
    #[error("Recursive single-pass render call; the target stack would recurse")]
    RecursiveBlit,

    /// A uniform slot name is not part of the store's contract.
    #[error("Unknown uniform slot: {name}")]
    UnknownUniform {
        /// The offending slot name
        name: String,
    },

    /// A uniform slot was written with a value of the wrong semantic type.
    #[error("Uniform slot {name} expects {expected}, got {got}")]
    UniformTypeMismatch {
        /// The offending slot name
        name: String,
        /// Declared slot type
        expected: &'static str,
        /// Type of the rejected value
        got: &'static str,
    },
}

/// Alias for `Result<T, LustreError>`.
pub type Result<T> = std::result::Result<T, LustreError>;

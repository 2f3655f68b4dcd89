//! Vision-language model bridge runtime
//!
//! Core library for driving an on-device vision-language model from a host
//! application: load a model variant asynchronously with progress reporting,
//! run image+prompt inference without blocking the caller, and cancel
//! in-flight work. All notifications reach the host through ordered callbacks
//! on a dedicated delivery thread.

pub mod backend;
pub mod bridge;
pub mod types;

// Re-export the main surface for convenience
pub use backend::{
    BackendError, BackendFactory, BackendModel, CancelToken, InferenceRequest, VisionBackend,
};
pub use bridge::{BridgeError, VlmBridge};
pub use types::events::{InferenceCallback, InferenceUpdate, LoadCallback, LoadUpdate};
pub use types::model::ModelVariant;
pub use types::params::GenerationParams;

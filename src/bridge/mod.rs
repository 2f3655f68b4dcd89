//! Bridge runtime
//!
//! The asynchronous engine behind the host-facing entry points: model
//! lifecycle and inference session state machines, the worker thread that
//! owns the backend, and the delivery thread that marshals callbacks.
//!
//! # Architecture
//!
//! Backend types may hold thread-affine resources, so all backend work runs
//! on a dedicated worker thread fed by a command channel. Host callbacks are
//! never invoked from the worker or the caller's thread; they are forwarded
//! to a single delivery thread so ordering per request is structural.

pub mod facade;
pub mod lifecycle;
pub mod session;

pub(crate) mod marshal;
pub(crate) mod shared;
pub(crate) mod worker;

pub use facade::VlmBridge;
pub use lifecycle::{ModelLifecycle, ModelState};
pub use session::{SessionController, SessionState};

use thiserror::Error;

use crate::types::params::ParamsError;

/// Errors returned synchronously by the bridge entry points
///
/// Every variant here means the call had no effect: no state change, no
/// callback registered, nothing dispatched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("bridge not initialized")]
    NotInitialized,

    #[error("a model load is already in progress")]
    LoadInProgress,

    #[error("cannot load a model while an inference is running")]
    InferenceRunning,

    #[error("no model loaded")]
    ModelNotLoaded,

    #[error("an inference is already running")]
    InferenceBusy,

    #[error("invalid generation parameters: {0}")]
    InvalidParameters(#[from] ParamsError),

    #[error("invalid image: {width}x{height} expects {expected} bytes, got {actual}")]
    InvalidImage {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("worker thread error: {0}")]
    Worker(String),
}

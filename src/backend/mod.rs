//! Inference backend abstraction
//!
//! The bridge treats the actual model runtime (weights, tensor math,
//! accelerator kernels) as an opaque capability behind the [`VisionBackend`]
//! trait. Backend types may hold thread-affine resources and are therefore
//! not required to be `Send`: the backend is constructed *on* the worker
//! thread through a [`BackendFactory`] and never leaves it.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::types::model::ModelVariant;
use crate::types::params::GenerationParams;

/// Errors reported by a backend
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    #[error("model load failed: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    /// The backend observed the cancel token and unwound early
    #[error("generation aborted")]
    Aborted,
}

/// Opaque handle to a backend-owned loaded model
///
/// The bridge holds at most one of these at a time and never inspects it;
/// only the backend that produced it knows the concrete type inside.
pub struct BackendModel(Box<dyn Any>);

impl BackendModel {
    pub fn new<T: Any>(inner: T) -> Self {
        Self(Box::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }
}

impl fmt::Debug for BackendModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackendModel(..)")
    }
}

/// Cooperative cancellation signal
///
/// The controller triggers it; the backend polls it at its yield points
/// (typically once per generated token) and unwinds promptly once set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One inference request as handed to the backend
///
/// The image buffer is owned: the bridge copies the host's pixels before
/// `infer_async` returns, so the host is free to reuse its buffer
/// immediately.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// RGBA8 pixels, row-major, `width * height * 4` bytes
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// UTF-8 prompt text
    pub prompt: String,
    /// Parameters captured when the request was accepted
    pub params: GenerationParams,
}

impl InferenceRequest {
    /// Bytes per pixel in the fixed RGBA8 format
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Required buffer length for the given dimensions
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL
    }
}

/// The opaque inference backend capability
pub trait VisionBackend {
    /// Loads `variant`, reporting fractional progress in [0.0, 1.0] through
    /// `progress`. Returns the opaque model handle on success.
    fn load(
        &mut self,
        variant: ModelVariant,
        progress: &mut dyn FnMut(f32),
    ) -> Result<BackendModel, BackendError>;

    /// Runs one generation against a previously loaded model.
    ///
    /// Partial text may be streamed through `sink` as it is produced; the
    /// full result is returned at the end. The backend must poll `cancel`
    /// at its yield points and may return [`BackendError::Aborted`] once it
    /// observes a cancellation.
    fn run(
        &mut self,
        model: &mut BackendModel,
        request: &InferenceRequest,
        sink: &mut dyn FnMut(&str),
        cancel: &CancelToken,
    ) -> Result<String, BackendError>;
}

/// Constructor invoked on the worker thread during bridge initialization
pub type BackendFactory = Box<dyn FnOnce() -> Box<dyn VisionBackend> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        token.trigger();
        assert!(clone.is_cancelled());
        // Idempotent
        token.trigger();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_expected_len() {
        assert_eq!(InferenceRequest::expected_len(224, 224), 224 * 224 * 4);
        assert_eq!(InferenceRequest::expected_len(0, 224), 0);
    }

    #[test]
    fn test_backend_model_downcast() {
        let mut model = BackendModel::new(42u32);
        assert_eq!(model.downcast_ref::<u32>(), Some(&42));
        assert_eq!(model.downcast_ref::<String>(), None);
        if let Some(value) = model.downcast_mut::<u32>() {
            *value = 7;
        }
        assert_eq!(model.downcast_ref::<u32>(), Some(&7));
    }
}

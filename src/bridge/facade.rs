//! Public bridge entry points
//!
//! [`VlmBridge`] is the process-scoped context object behind the native
//! surface. Entry points validate preconditions under short-lived locks,
//! copy host-owned buffers, and dispatch to the worker thread; none of them
//! block on backend work.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::backend::{BackendFactory, InferenceRequest};
use crate::bridge::marshal::Marshaler;
use crate::bridge::shared::{lock, SharedState};
use crate::bridge::worker::{worker_thread_main, WorkerCommand};
use crate::bridge::BridgeError;
use crate::types::events::{InferenceCallback, LoadCallback};
use crate::types::model::ModelVariant;
use crate::types::params::GenerationParams;

/// The vision-language model bridge
///
/// Owns the worker thread (backend execution) and the delivery thread
/// (callback marshaling). Independent instances are fully isolated, which
/// keeps the runtime testable without process-global state.
pub struct VlmBridge {
    shared: Arc<SharedState>,
    factory: Option<BackendFactory>,
    command_tx: Option<Sender<WorkerCommand>>,
    worker_handle: Option<JoinHandle<()>>,
    marshaler: Option<Marshaler>,
    initialized: bool,
}

impl VlmBridge {
    /// Creates an uninitialized bridge around a backend factory.
    ///
    /// The factory runs on the worker thread during [`initialize`], so the
    /// backend itself never has to be `Send`.
    ///
    /// [`initialize`]: VlmBridge::initialize
    pub fn new(factory: BackendFactory) -> Self {
        Self {
            shared: Arc::new(SharedState::new()),
            factory: Some(factory),
            command_tx: None,
            worker_handle: None,
            marshaler: None,
            initialized: false,
        }
    }

    /// Establishes the worker and delivery threads. Idempotent.
    ///
    /// Must be called before any other entry point; calls made earlier fail
    /// with [`BridgeError::NotInitialized`].
    pub fn initialize(&mut self) -> Result<(), BridgeError> {
        if self.initialized {
            return Ok(());
        }
        let factory = match self.factory.take() {
            Some(factory) => factory,
            None => return Err(BridgeError::Worker("backend factory consumed".to_string())),
        };

        let marshaler = Marshaler::spawn(self.shared.clone());
        let delivery_tx = marshaler.sender();
        let (command_tx, command_rx) = mpsc::channel();
        let shared = self.shared.clone();
        let handle =
            thread::spawn(move || worker_thread_main(factory, command_rx, delivery_tx, shared));

        self.marshaler = Some(marshaler);
        self.command_tx = Some(command_tx);
        self.worker_handle = Some(handle);
        self.initialized = true;
        tracing::info!("vlm bridge initialized");
        Ok(())
    }

    fn command_tx(&self) -> Result<&Sender<WorkerCommand>, BridgeError> {
        self.command_tx.as_ref().ok_or(BridgeError::NotInitialized)
    }

    /// Begins loading `variant` asynchronously.
    ///
    /// Rejected while another load is in flight or an inference is active;
    /// on rejection the callback is never invoked. Otherwise `callback`
    /// receives non-decreasing progress ticks followed by exactly one
    /// terminal update.
    pub fn load_model(
        &self,
        variant: ModelVariant,
        callback: LoadCallback,
    ) -> Result<(), BridgeError> {
        let tx = self.command_tx()?;

        // Lock order: lifecycle before session.
        let mut lifecycle = lock(&self.shared.lifecycle);
        // Swapping models mid-inference is rejected rather than treated as
        // an implicit cancel-then-load.
        if lock(&self.shared.session).is_running() {
            return Err(BridgeError::InferenceRunning);
        }
        let previous = lifecycle.state();
        lifecycle.begin_load(variant)?;
        if tx
            .send(WorkerCommand::LoadModel { variant, callback })
            .is_err()
        {
            lifecycle.restore(previous);
            return Err(BridgeError::Worker("worker thread is gone".to_string()));
        }
        tracing::debug!("load dispatched for {variant}");
        Ok(())
    }

    /// Updates the generation parameters used by the *next* accepted
    /// request. Out-of-range values are rejected with no stored change.
    pub fn set_generation_parameters(
        &self,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<(), BridgeError> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized);
        }
        let params = GenerationParams::new(temperature, max_tokens)?;
        *lock(&self.shared.params) = params;
        tracing::debug!("generation parameters set: temperature={temperature} max_tokens={max_tokens}");
        Ok(())
    }

    /// Runs inference on an image+prompt pair asynchronously.
    ///
    /// `image` must hold RGBA8 pixels, `width * height * 4` bytes; it is
    /// copied before this returns, so the host may reuse the buffer
    /// immediately. Precondition failures are synchronous and the callback
    /// is never invoked. An accepted request yields streamed partials
    /// followed by exactly one terminal update.
    pub fn infer_async(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        prompt: &str,
        callback: InferenceCallback,
    ) -> Result<(), BridgeError> {
        let tx = self.command_tx()?;

        let expected = InferenceRequest::expected_len(width, height);
        if width == 0 || height == 0 || image.len() != expected {
            return Err(BridgeError::InvalidImage {
                width,
                height,
                expected,
                actual: image.len(),
            });
        }

        let lifecycle = lock(&self.shared.lifecycle);
        if !lifecycle.is_loaded() {
            return Err(BridgeError::ModelNotLoaded);
        }
        let mut session = lock(&self.shared.session);
        let cancel = session.try_begin()?;
        let request = InferenceRequest {
            image: image.to_vec(),
            width,
            height,
            prompt: prompt.to_string(),
            params: *lock(&self.shared.params),
        };
        if tx
            .send(WorkerCommand::Infer {
                request,
                cancel,
                callback,
            })
            .is_err()
        {
            session.abandon();
            return Err(BridgeError::Worker("worker thread is gone".to_string()));
        }
        tracing::debug!("inference dispatched ({width}x{height})");
        Ok(())
    }

    /// Requests cancellation of the in-flight inference.
    ///
    /// Non-blocking; a no-op when idle. The original callback still receives
    /// exactly one terminal update, reported as cancelled.
    pub fn cancel(&self) {
        if lock(&self.shared.session).request_cancel() {
            tracing::info!("inference cancellation requested");
        }
    }

    /// True iff a model is fully loaded and ready for inference
    pub fn is_model_loaded(&self) -> bool {
        lock(&self.shared.lifecycle).is_loaded()
    }

    /// True iff an inference is running or cancelling
    pub fn is_inference_running(&self) -> bool {
        lock(&self.shared.session).is_running()
    }
}

impl Drop for VlmBridge {
    fn drop(&mut self) {
        // Stop the worker first so no more deliveries are produced, then
        // drain the delivery thread.
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(WorkerCommand::Shutdown);
        }
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
        if let Some(mut marshaler) = self.marshaler.take() {
            marshaler.shutdown();
        }
    }
}

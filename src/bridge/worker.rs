//! Worker thread owning the backend
//!
//! The backend instance and the current model handle live on one dedicated
//! thread; all long-running work (model load, generation) happens here,
//! keeping the host-facing entry points non-blocking. Results are forwarded
//! to the delivery thread, never invoked directly.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use crate::backend::{
    BackendError, BackendFactory, BackendModel, CancelToken, InferenceRequest, VisionBackend,
};
use crate::bridge::marshal::Delivery;
use crate::bridge::shared::{lock, SharedState};
use crate::types::events::{InferenceCallback, InferenceUpdate, LoadCallback, LoadUpdate};
use crate::types::model::ModelVariant;

/// Commands sent to the worker thread
pub(crate) enum WorkerCommand {
    LoadModel {
        variant: ModelVariant,
        callback: LoadCallback,
    },
    Infer {
        request: InferenceRequest,
        cancel: CancelToken,
        callback: InferenceCallback,
    },
    Shutdown,
}

/// Worker thread main loop
pub(crate) fn worker_thread_main(
    factory: BackendFactory,
    command_rx: Receiver<WorkerCommand>,
    delivery_tx: Sender<Delivery>,
    shared: Arc<SharedState>,
) {
    let mut backend: Box<dyn VisionBackend> = factory();
    let mut current: Option<(ModelVariant, BackendModel)> = None;
    tracing::info!("bridge worker thread started");

    loop {
        match command_rx.recv() {
            Ok(WorkerCommand::LoadModel { variant, callback }) => {
                let _ = delivery_tx.send(Delivery::RegisterLoad(callback));
                let result = run_load(backend.as_mut(), variant, &delivery_tx);
                match result {
                    Ok(model) => {
                        // The previous handle is released only now, once the
                        // replacement is ready.
                        current = Some((variant, model));
                        tracing::info!("model {variant} loaded");
                        let _ = delivery_tx.send(Delivery::Load(LoadUpdate::Completed));
                    }
                    Err(e) => {
                        tracing::warn!("model {variant} load failed: {e}");
                        current = None;
                        let _ =
                            delivery_tx.send(Delivery::Load(LoadUpdate::Failed(e.to_string())));
                    }
                }
            }
            Ok(WorkerCommand::Infer {
                request,
                cancel,
                callback,
            }) => {
                let _ = delivery_tx.send(Delivery::RegisterInference(callback));
                let natural = run_inference(
                    backend.as_mut(),
                    current.as_mut(),
                    &request,
                    &cancel,
                    &delivery_tx,
                );
                let terminal = lock(&shared.session).resolve(natural);
                match &terminal {
                    InferenceUpdate::Completed(_) => tracing::debug!("inference completed"),
                    InferenceUpdate::Cancelled => tracing::info!("inference cancelled"),
                    InferenceUpdate::Failed(e) => tracing::warn!("inference failed: {e}"),
                    InferenceUpdate::Token(_) => {}
                }
                let _ = delivery_tx.send(Delivery::Inference(terminal));
            }
            Ok(WorkerCommand::Shutdown) => {
                tracing::info!("bridge worker shutting down");
                break;
            }
            Err(_) => {
                tracing::debug!("command channel closed, worker exiting");
                break;
            }
        }
    }
}

/// Runs a backend load, forwarding clamped, non-decreasing progress ticks
fn run_load(
    backend: &mut dyn VisionBackend,
    variant: ModelVariant,
    delivery_tx: &Sender<Delivery>,
) -> Result<BackendModel, BackendError> {
    let tx = delivery_tx.clone();
    let mut last = -1.0f32;
    let mut progress = move |p: f32| {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        if p < last {
            tracing::warn!("dropping regressing load progress tick {p}");
            return;
        }
        last = p;
        let _ = tx.send(Delivery::Load(LoadUpdate::Progress(p)));
    };
    backend.load(variant, &mut progress)
}

/// Runs one generation against the current model
fn run_inference(
    backend: &mut dyn VisionBackend,
    current: Option<&mut (ModelVariant, BackendModel)>,
    request: &InferenceRequest,
    cancel: &CancelToken,
    delivery_tx: &Sender<Delivery>,
) -> Result<String, BackendError> {
    let (_, model) = match current {
        Some(entry) => entry,
        // The facade gates on is_loaded, so this only happens if a swap
        // failed between acceptance and execution.
        None => return Err(BackendError::Inference("no model loaded".to_string())),
    };

    let tx = delivery_tx.clone();
    let sink_cancel = cancel.clone();
    let mut sink = move |text: &str| {
        // Partials produced after a cancel request are suppressed; the
        // terminal Cancelled update is the only thing the host still sees.
        if sink_cancel.is_cancelled() {
            return;
        }
        let _ = tx.send(Delivery::Inference(InferenceUpdate::Token(text.to_string())));
    };
    backend.run(model, request, &mut sink, cancel)
}

//! Callback marshaling
//!
//! Every host callback is invoked on a single dedicated delivery thread,
//! never on the caller's thread or the worker. Callback registrations travel
//! through the same FIFO channel as the events they precede, so per-request
//! ordering needs no extra bookkeeping: progress arrives before the
//! terminal, and the callback is dropped at its terminal event, after which
//! nothing can be delivered to it.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::bridge::shared::{lock, SharedState};
use crate::types::events::{InferenceCallback, InferenceUpdate, LoadCallback, LoadUpdate};

/// Items processed in order by the delivery thread
pub(crate) enum Delivery {
    RegisterLoad(LoadCallback),
    Load(LoadUpdate),
    RegisterInference(InferenceCallback),
    Inference(InferenceUpdate),
    Shutdown,
}

/// Handle to the delivery thread
pub(crate) struct Marshaler {
    tx: Sender<Delivery>,
    handle: Option<JoinHandle<()>>,
}

impl Marshaler {
    pub fn spawn(shared: Arc<SharedState>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || delivery_thread_main(rx, shared));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> Sender<Delivery> {
        self.tx.clone()
    }

    /// Drains queued deliveries, then stops the thread
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(Delivery::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Marshaler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn delivery_thread_main(rx: Receiver<Delivery>, shared: Arc<SharedState>) {
    let mut load_cb: Option<LoadCallback> = None;
    let mut infer_cb: Option<InferenceCallback> = None;

    loop {
        match rx.recv() {
            Ok(Delivery::RegisterLoad(cb)) => load_cb = Some(cb),
            Ok(Delivery::Load(update)) => {
                let terminal = update.is_terminal();
                if terminal {
                    // Commit the lifecycle transition here, on the delivery
                    // context, so is_model_loaded() cannot read true while
                    // progress ticks are still in flight.
                    let success = matches!(update, LoadUpdate::Completed);
                    lock(&shared.lifecycle).commit_load(success);
                }
                if let Some(cb) = load_cb.as_mut() {
                    cb(update);
                }
                if terminal {
                    load_cb = None;
                }
            }
            Ok(Delivery::RegisterInference(cb)) => infer_cb = Some(cb),
            Ok(Delivery::Inference(update)) => {
                let terminal = update.is_terminal();
                if let Some(cb) = infer_cb.as_mut() {
                    cb(update);
                }
                if terminal {
                    infer_cb = None;
                }
            }
            Ok(Delivery::Shutdown) => break,
            Err(_) => {
                tracing::debug!("delivery channel closed, delivery thread exiting");
                break;
            }
        }
    }
}

//! State shared between the facade, worker, and delivery threads

use std::sync::{Mutex, MutexGuard};

use crate::bridge::lifecycle::ModelLifecycle;
use crate::bridge::session::SessionController;
use crate::types::params::GenerationParams;

/// The process-scoped mutable bridge state
///
/// Every state transition is serialized through these mutexes. Lock order
/// where both are needed: lifecycle before session.
pub(crate) struct SharedState {
    pub lifecycle: Mutex<ModelLifecycle>,
    pub session: Mutex<SessionController>,
    pub params: Mutex<GenerationParams>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            lifecycle: Mutex::new(ModelLifecycle::new()),
            session: Mutex::new(SessionController::new()),
            params: Mutex::new(GenerationParams::default()),
        }
    }
}

/// Locks a state mutex, recovering from poisoning.
///
/// A poisoned lock here only means a host callback panicked mid-delivery;
/// the guarded state machines stay internally consistent, so we keep going.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Model lifecycle state machine
//!
//! Tracks the host-visible load state: unloaded, loading, or loaded with a
//! specific variant. A failed load collapses straight back to unloaded so
//! the host can retry; the failure itself is reported through the load
//! callback. The backend-side model handle lives on the worker thread and is
//! swapped there, so from the host's viewpoint a superseding load replaces
//! the old model atomically at the moment the terminal success is delivered.

use crate::bridge::BridgeError;
use crate::types::model::ModelVariant;

/// Host-visible model state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading(ModelVariant),
    Loaded(ModelVariant),
}

/// Owns the load state machine
///
/// All access goes through a mutex in the shared bridge state; the methods
/// themselves assume exclusive access.
#[derive(Debug)]
pub struct ModelLifecycle {
    state: ModelState,
}

impl ModelLifecycle {
    pub fn new() -> Self {
        Self {
            state: ModelState::Unloaded,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// True iff the state is exactly `Loaded`
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    pub fn loaded_variant(&self) -> Option<ModelVariant> {
        match self.state {
            ModelState::Loaded(variant) => Some(variant),
            _ => None,
        }
    }

    /// Begins a load. Rejected while another load is in flight; allowed from
    /// unloaded or loaded (the loaded case is a model swap).
    pub fn begin_load(&mut self, variant: ModelVariant) -> Result<(), BridgeError> {
        match self.state {
            ModelState::Loading(_) => Err(BridgeError::LoadInProgress),
            ModelState::Unloaded | ModelState::Loaded(_) => {
                self.state = ModelState::Loading(variant);
                Ok(())
            }
        }
    }

    /// Reverts a `begin_load` whose dispatch to the worker failed
    pub(crate) fn restore(&mut self, previous: ModelState) {
        self.state = previous;
    }

    /// Commits the terminal outcome of the in-flight load.
    ///
    /// Runs on the delivery thread immediately before the terminal callback,
    /// so `is_loaded` cannot read true while progress ticks are still being
    /// delivered.
    pub fn commit_load(&mut self, success: bool) {
        self.state = match (self.state, success) {
            (ModelState::Loading(variant), true) => ModelState::Loaded(variant),
            (ModelState::Loading(_), false) => ModelState::Unloaded,
            (other, _) => other,
        };
    }
}

impl Default for ModelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let lifecycle = ModelLifecycle::new();
        assert_eq!(lifecycle.state(), ModelState::Unloaded);
        assert!(!lifecycle.is_loaded());
        assert!(lifecycle.loaded_variant().is_none());
    }

    #[test]
    fn test_load_success_path() {
        let mut lifecycle = ModelLifecycle::new();
        lifecycle
            .begin_load(ModelVariant::FastVlm05B)
            .expect("begin");
        assert!(!lifecycle.is_loaded());
        lifecycle.commit_load(true);
        assert_eq!(
            lifecycle.loaded_variant(),
            Some(ModelVariant::FastVlm05B)
        );
    }

    #[test]
    fn test_load_failure_resets_to_unloaded() {
        let mut lifecycle = ModelLifecycle::new();
        lifecycle
            .begin_load(ModelVariant::FastVlm7B)
            .expect("begin");
        lifecycle.commit_load(false);
        assert_eq!(lifecycle.state(), ModelState::Unloaded);
        // Retry is allowed after a failure
        assert!(lifecycle.begin_load(ModelVariant::FastVlm7B).is_ok());
    }

    #[test]
    fn test_rejects_load_while_loading() {
        let mut lifecycle = ModelLifecycle::new();
        lifecycle
            .begin_load(ModelVariant::FastVlm05B)
            .expect("begin");
        assert_eq!(
            lifecycle.begin_load(ModelVariant::FastVlm15B),
            Err(BridgeError::LoadInProgress)
        );
        // The in-flight load is undisturbed
        assert_eq!(
            lifecycle.state(),
            ModelState::Loading(ModelVariant::FastVlm05B)
        );
    }

    #[test]
    fn test_model_swap() {
        let mut lifecycle = ModelLifecycle::new();
        lifecycle
            .begin_load(ModelVariant::FastVlm05B)
            .expect("begin");
        lifecycle.commit_load(true);
        // Loading a different variant supersedes the current one
        lifecycle
            .begin_load(ModelVariant::FastVlm15B)
            .expect("swap");
        assert!(!lifecycle.is_loaded());
        lifecycle.commit_load(true);
        assert_eq!(
            lifecycle.loaded_variant(),
            Some(ModelVariant::FastVlm15B)
        );
    }

    #[test]
    fn test_restore_after_failed_dispatch() {
        let mut lifecycle = ModelLifecycle::new();
        lifecycle
            .begin_load(ModelVariant::FastVlm05B)
            .expect("begin");
        lifecycle.commit_load(true);
        let previous = lifecycle.state();
        lifecycle
            .begin_load(ModelVariant::FastVlm7B)
            .expect("swap");
        lifecycle.restore(previous);
        assert_eq!(
            lifecycle.loaded_variant(),
            Some(ModelVariant::FastVlm05B)
        );
    }
}

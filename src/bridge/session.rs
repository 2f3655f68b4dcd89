//! Inference session state machine
//!
//! Enforces single-flight: at most one inference session exists at any
//! instant. The backend inference path is non-reentrant (one model context,
//! one active generation), so a second request is rejected rather than
//! queued.
//!
//! Cancellation is resolved deterministically: `request_cancel` and
//! `resolve` both run under the session mutex, so a cancel that lands before
//! the worker resolves the session always wins, even if the backend had
//! already completed naturally.

use crate::backend::{BackendError, CancelToken};
use crate::bridge::BridgeError;
use crate::types::events::InferenceUpdate;

/// Inference session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// A cancel was requested; waiting for the backend to unwind
    Cancelling,
}

/// Owns the single in-flight session
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    cancel: Option<CancelToken>,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            cancel: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True iff a session is running or cancelling
    pub fn is_running(&self) -> bool {
        self.state != SessionState::Idle
    }

    /// Accepts a new session if idle, returning its cancel token
    pub fn try_begin(&mut self) -> Result<CancelToken, BridgeError> {
        if self.state != SessionState::Idle {
            return Err(BridgeError::InferenceBusy);
        }
        let token = CancelToken::new();
        self.cancel = Some(token.clone());
        self.state = SessionState::Running;
        Ok(token)
    }

    /// Reverts an accepted session whose dispatch to the worker failed
    pub(crate) fn abandon(&mut self) {
        self.state = SessionState::Idle;
        self.cancel = None;
    }

    /// Requests cancellation. Returns true if a running session moved to
    /// cancelling; a no-op when idle or already cancelling.
    pub fn request_cancel(&mut self) -> bool {
        match self.state {
            SessionState::Running => {
                if let Some(token) = &self.cancel {
                    token.trigger();
                }
                self.state = SessionState::Cancelling;
                true
            }
            SessionState::Idle | SessionState::Cancelling => false,
        }
    }

    /// Resolves the session with the backend's natural outcome and returns
    /// the single terminal update to deliver.
    ///
    /// Cancellation wins: if a cancel was requested before this ran, the
    /// terminal is `Cancelled` regardless of what the backend produced.
    pub fn resolve(&mut self, natural: Result<String, BackendError>) -> InferenceUpdate {
        let cancelled = self.state == SessionState::Cancelling
            || self
                .cancel
                .as_ref()
                .map(CancelToken::is_cancelled)
                .unwrap_or(false);
        self.state = SessionState::Idle;
        self.cancel = None;

        if cancelled {
            return InferenceUpdate::Cancelled;
        }
        match natural {
            Ok(text) => InferenceUpdate::Completed(text),
            Err(e) => InferenceUpdate::Failed(e.to_string()),
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let controller = SessionController::new();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_single_flight() {
        let mut controller = SessionController::new();
        controller.try_begin().expect("first accepted");
        assert!(controller.is_running());
        assert_eq!(controller.try_begin().err(), Some(BridgeError::InferenceBusy));
    }

    #[test]
    fn test_natural_completion() {
        let mut controller = SessionController::new();
        controller.try_begin().expect("accepted");
        let terminal = controller.resolve(Ok("a cat".to_string()));
        assert_eq!(terminal, InferenceUpdate::Completed("a cat".to_string()));
        assert!(!controller.is_running());
        // A new session may start after resolution
        assert!(controller.try_begin().is_ok());
    }

    #[test]
    fn test_backend_failure() {
        let mut controller = SessionController::new();
        controller.try_begin().expect("accepted");
        let terminal = controller.resolve(Err(BackendError::Inference("oom".to_string())));
        assert_eq!(
            terminal,
            InferenceUpdate::Failed("inference failed: oom".to_string())
        );
    }

    #[test]
    fn test_cancel_idle_is_noop() {
        let mut controller = SessionController::new();
        assert!(!controller.request_cancel());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_cancel_running() {
        let mut controller = SessionController::new();
        let token = controller.try_begin().expect("accepted");
        assert!(controller.request_cancel());
        assert!(token.is_cancelled());
        assert_eq!(controller.state(), SessionState::Cancelling);
        // Still counts as running for the host
        assert!(controller.is_running());
        // A second cancel is a no-op
        assert!(!controller.request_cancel());
    }

    #[test]
    fn test_cancellation_wins_over_natural_completion() {
        let mut controller = SessionController::new();
        controller.try_begin().expect("accepted");
        controller.request_cancel();
        // Backend finished naturally anyway; the cancel still wins
        let terminal = controller.resolve(Ok("done".to_string()));
        assert_eq!(terminal, InferenceUpdate::Cancelled);
    }

    #[test]
    fn test_cancelled_backend_abort() {
        let mut controller = SessionController::new();
        controller.try_begin().expect("accepted");
        controller.request_cancel();
        let terminal = controller.resolve(Err(BackendError::Aborted));
        assert_eq!(terminal, InferenceUpdate::Cancelled);
    }
}

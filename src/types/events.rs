//! Callback payload types
//!
//! Everything the bridge reports back to the host travels through these two
//! enums. A request sees zero or more non-terminal updates followed by
//! exactly one terminal update, after which its callback is released.

/// Notifications for a model load
///
/// Progress convention: zero or more `Progress(p)` ticks with `p` in
/// [0.0, 1.0], non-decreasing, then exactly one `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadUpdate {
    /// Fractional load progress
    Progress(f32),
    /// The model is loaded and ready for inference
    Completed,
    /// The load failed; the bridge is back to unloaded and may retry
    Failed(String),
}

impl LoadUpdate {
    /// True for `Completed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Notifications for an inference request
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceUpdate {
    /// Streamed partial text, delivered in arrival order
    Token(String),
    /// Terminal: the full generated text
    Completed(String),
    /// Terminal: the backend failed
    Failed(String),
    /// Terminal: the request was cancelled by the host
    Cancelled,
}

impl InferenceUpdate {
    /// True for everything except `Token`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Token(_))
    }
}

/// Host callback for model-load notifications
pub type LoadCallback = Box<dyn FnMut(LoadUpdate) + Send>;

/// Host callback for inference notifications
pub type InferenceCallback = Box<dyn FnMut(InferenceUpdate) + Send>;

//! # Error types for the injection engine.
//!
//! The taxonomy mirrors how an attempt can fail: explicit cancellation,
//! navigation that never succeeded, an exhausted selector cascade, a script
//! or surface failure, and a clipboard write that could not complete.
//! Cancellation and navigation failure are terminal and never degrade to
//! the clipboard; element and script failures are recovered locally by the
//! fallback path.

use thiserror::Error;

/// Failure of a single injection attempt or flow.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The caller cancelled before the script was dispatched.
    #[error("Cancelled")]
    Cancelled,

    /// The page never reported a successful navigation; no attempt ran.
    #[error("navigation failed before injection could start")]
    NavigationFailed,

    /// The in-page script exhausted the selector cascade.
    #[error("no input element matched the selector cascade")]
    ElementNotFound,

    /// The script or the surface failed in an unexpected way, including
    /// unrecognized wire tokens.
    #[error("script evaluation failed: {0}")]
    ScriptException(String),

    /// The bounded wait for script evaluation expired.
    #[error("script evaluation timed out after {elapsed_ms}ms")]
    EvaluateTimeout { elapsed_ms: u64 },

    /// The clipboard fallback itself failed.
    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

impl InjectionError {
    /// Whether the fallback path may recover this error by writing the
    /// clipboard. Cancellation and navigation failure carry explicit intent
    /// or a page that never existed; nothing can be recovered.
    pub fn is_degradable(&self) -> bool {
        !matches!(
            self,
            InjectionError::Cancelled | InjectionError::NavigationFailed
        )
    }
}

/// Errors surfaced by the embedded browser boundary.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("script evaluation failed on the page: {0}")]
    Evaluation(String),

    #[error("no page is attached to the surface")]
    Detached,
}

/// Errors surfaced by the OS clipboard boundary.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard backend error: {0}")]
    Backend(String),
}

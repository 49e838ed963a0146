//! # Result types for injection attempts and flows.

use serde::Serialize;

/// Closed three-value classification of an attempt or a folded flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InjectionStatus {
    /// The script confirmed the value was set in a live element.
    Success,
    /// Terminal failure with no clipboard write (cancellation, navigation
    /// failure, or a failed clipboard fallback).
    Failed,
    /// The verbatim prompt text was written to the OS clipboard.
    FallbackClipboard,
}

impl std::fmt::Display for InjectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectionStatus::Success => write!(f, "success"),
            InjectionStatus::Failed => write!(f, "failed"),
            InjectionStatus::FallbackClipboard => write!(f, "fallback-clipboard"),
        }
    }
}

/// Outcome of one attempt, or of a whole retry flow after folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionReport {
    pub status: InjectionStatus,
    /// Success detail from the wire token, e.g. `"value-set"`.
    pub detail: Option<String>,
    /// The original error for `Failed` and `FallbackClipboard`.
    pub error: Option<String>,
    /// Executor attempts that actually ran (zero when navigation failed).
    pub attempts: u32,
}

impl InjectionReport {
    pub fn success(detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: InjectionStatus::Success,
            detail: Some(detail.into()),
            error: None,
            attempts,
        }
    }

    pub fn failed(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: InjectionStatus::Failed,
            detail: None,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn fallback(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: InjectionStatus::FallbackClipboard,
            detail: None,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InjectionStatus::Success
    }

    pub fn used_fallback(&self) -> bool {
        self.status == InjectionStatus::FallbackClipboard
    }

    /// Whether this report ends the flow with explicit caller intent.
    pub fn is_cancelled(&self) -> bool {
        self.status == InjectionStatus::Failed && self.error.as_deref() == Some("Cancelled")
    }
}

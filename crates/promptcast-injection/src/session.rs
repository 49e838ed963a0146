//! # Per-page injection session.
//!
//! One session per page-load instance, carrying the flow state machine and
//! the one-shot injection latch. The session makes re-entrancy explicit:
//! every state past `Loading` is reachable at most once, and a latched
//! session never starts a second injection regardless of how many
//! navigation events the page emits.

use thiserror::Error;
use tracing::debug;

/// Flow state for one page-load instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// No navigation observed yet.
    #[default]
    Idle,
    /// Navigation started, page not ready.
    Loading,
    /// Navigation never succeeded. Terminal.
    NavigationFailed,
    /// Retry loop running.
    Injecting,
    /// Value confirmed set in a live element.
    Injected,
    /// Flow degraded to the OS clipboard.
    ClipboardFallback,
    /// Echo guard armed on the page.
    GuardInstalled,
    /// Outcome recorded in the execution history. Terminal.
    Recorded,
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageState::Idle => write!(f, "IDLE"),
            PageState::Loading => write!(f, "LOADING"),
            PageState::NavigationFailed => write!(f, "NAVIGATION_FAILED"),
            PageState::Injecting => write!(f, "INJECTING"),
            PageState::Injected => write!(f, "INJECTED"),
            PageState::ClipboardFallback => write!(f, "CLIPBOARD_FALLBACK"),
            PageState::GuardInstalled => write!(f, "GUARD_INSTALLED"),
            PageState::Recorded => write!(f, "RECORDED"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid page state transition: {from} -> {to}")]
    InvalidTransition { from: PageState, to: PageState },
}

/// State machine plus one-shot latch for a single page-load instance.
#[derive(Debug)]
pub struct PageSession {
    engine_name: String,
    state: PageState,
    latched: bool,
}

impl PageSession {
    pub fn new(engine_name: impl Into<String>) -> Self {
        Self {
            engine_name: engine_name.into(),
            state: PageState::Idle,
            latched: false,
        }
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Whether an injection attempt has begun for this page instance.
    pub fn latched(&self) -> bool {
        self.latched
    }

    /// Arm the one-shot latch. Returns `false` when already armed; the
    /// latch is never reset for this instance.
    pub fn arm_latch(&mut self) -> bool {
        if self.latched {
            return false;
        }
        self.latched = true;
        true
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, PageState::NavigationFailed | PageState::Recorded)
    }

    /// Move to `next`, validating against the flow's transition table.
    pub fn transition(&mut self, next: PageState) -> Result<(), SessionError> {
        let valid = matches!(
            (self.state, next),
            (PageState::Idle, PageState::Loading)
                | (PageState::Loading, PageState::NavigationFailed)
                | (PageState::Loading, PageState::Injecting)
                | (PageState::Injecting, PageState::Injected)
                | (PageState::Injecting, PageState::ClipboardFallback)
                // A cancelled or clipboard-failed flow records its outcome
                // without passing through a delivery state.
                | (PageState::Injecting, PageState::Recorded)
                | (PageState::Injected, PageState::GuardInstalled)
                | (PageState::Injected, PageState::Recorded)
                | (PageState::ClipboardFallback, PageState::Recorded)
                | (PageState::GuardInstalled, PageState::Recorded)
        );

        if !valid {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        debug!(engine = %self.engine_name, from = %self.state, to = %next, "page state transition");
        self.state = next;
        Ok(())
    }
}

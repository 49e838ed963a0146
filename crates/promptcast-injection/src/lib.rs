//! # Promptcast Injection Engine
//!
//! Places user text into a third-party chat page rendered in an embedded
//! browser surface, without double-submitting, and degrades to the system
//! clipboard when injection cannot be confirmed.
//!
//! The flow per page load:
//!
//! 1. [`PageLifecycleController`] gates on navigation success and the
//!    per-page one-shot latch.
//! 2. [`RetryCoordinator`] runs up to N serialized attempts with linear
//!    backoff.
//! 3. Each attempt builds one staged script ([`InjectionScriptBuilder`]),
//!    evaluates it on the page, and classifies the `success:*` / `error:*`
//!    wire token ([`InjectionExecutor`]).
//! 4. A confirmed success arms the [`PostInjectionGuard`], which clears
//!    content the page echoes back into its composer.
//!
//! The embedded browser, the OS clipboard, and the execution history store
//! are collaborator boundaries ([`ScriptSurface`], [`Clipboard`],
//! [`HistorySink`]); the engine never talks to a concrete browser or
//! clipboard implementation.

pub mod config;
pub mod error;
pub mod escape;
pub mod executor;
pub mod guard;
pub mod history;
pub mod lifecycle;
pub mod metrics;
pub mod outcome;
pub mod processor;
pub mod retry;
pub mod script;
pub mod session;

pub use config::InjectionConfig;
pub use error::{ClipboardError, InjectionError, SurfaceError};
pub use executor::{FallbackPolicy, InjectionExecutor};
pub use guard::PostInjectionGuard;
pub use history::{HistoryEntry, HistoryError, HistorySink, NullHistorySink};
pub use lifecycle::{PageLifecycleController, UserNotifier};
pub use metrics::InjectionMetrics;
pub use outcome::{InjectionReport, InjectionStatus};
pub use processor::{AsyncInjectionProcessor, PageEvent};
pub use retry::RetryCoordinator;
pub use script::InjectionScriptBuilder;
pub use session::{PageSession, PageState};

/// One user action: deliver this prompt to this engine. Immutable and
/// scoped to a single page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionRequest {
    pub engine_name: String,
    pub prompt_text: String,
}

impl InjectionRequest {
    pub fn new(engine_name: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        Self {
            engine_name: engine_name.into(),
            prompt_text: prompt_text.into(),
        }
    }
}

/// Script evaluation boundary of the embedded browser surface.
///
/// Evaluation is treated as a sequential request/response: callers never
/// issue a second evaluation while one is outstanding. A dispatched script
/// runs to completion on the page; cancellation only applies before
/// dispatch.
#[async_trait::async_trait]
pub trait ScriptSurface: Send + Sync {
    /// Evaluate a script on the current page and return its string result.
    async fn evaluate(&self, script: &str) -> Result<String, SurfaceError>;

    /// Short name for logs, e.g. `"cdp"`.
    fn surface_name(&self) -> &'static str {
        "surface"
    }
}

/// OS clipboard boundary. Only the fallback path writes here, at most once
/// per flow.
#[cfg_attr(test, mockall::automock)]
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

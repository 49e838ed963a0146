//! # Injection executor.
//!
//! Runs exactly one injection attempt against a loaded page: wait the
//! engine's settle delay, evaluate the staged script under a bounded
//! timeout, classify the wire token, and degrade to the clipboard when the
//! policy allows it. Attempts are strictly serialized by the callers; the
//! executor never has two evaluations outstanding.

use crate::config::InjectionConfig;
use crate::error::{ClipboardError, InjectionError};
use crate::escape::escape_for_script;
use crate::metrics::InjectionMetrics;
use crate::outcome::InjectionReport;
use crate::script::{InjectionScriptBuilder, TOKEN_INPUT_NOT_FOUND, WIRE_ERROR_PREFIX, WIRE_SUCCESS_PREFIX};
use crate::{Clipboard, ScriptSurface};
use parking_lot::Mutex;
use promptcast_engines::{DomTargetStrategy, EngineDescriptor};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What a failing attempt does with the prompt.
///
/// The public single-attempt entry point always degrades; the retry
/// coordinator passes `Report` to every attempt but the last so the
/// clipboard is written at most once per flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Write the raw prompt to the clipboard and report `FallbackClipboard`.
    Degrade,
    /// Report the failure and leave the clipboard untouched.
    Report,
}

/// Redact prompt content for privacy-first logging.
fn redact_text(text: &str, redact: bool) -> String {
    if redact {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();
        format!("len={} hash={:08x}", text.len(), (hash & 0xFFFF_FFFF))
    } else {
        text.to_string()
    }
}

/// Classify the wire token returned by the in-page script.
fn classify_token(token: &str) -> Result<String, InjectionError> {
    if let Some(rest) = token.strip_prefix(WIRE_SUCCESS_PREFIX) {
        return Ok(rest.strip_prefix(':').unwrap_or(rest).to_string());
    }
    if token == TOKEN_INPUT_NOT_FOUND {
        return Err(InjectionError::ElementNotFound);
    }
    if let Some(reason) = token.strip_prefix(WIRE_ERROR_PREFIX) {
        return Err(InjectionError::ScriptException(reason.to_string()));
    }
    Err(InjectionError::ScriptException(format!(
        "unrecognized result: {token}"
    )))
}

pub struct InjectionExecutor {
    config: InjectionConfig,
    clipboard: Arc<dyn Clipboard>,
    metrics: Arc<Mutex<InjectionMetrics>>,
}

impl InjectionExecutor {
    pub fn new(
        config: InjectionConfig,
        clipboard: Arc<dyn Clipboard>,
        metrics: Arc<Mutex<InjectionMetrics>>,
    ) -> Self {
        Self {
            config,
            clipboard,
            metrics,
        }
    }

    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    /// Run one attempt with the default degrading policy. This is the
    /// public single-attempt entry point.
    pub async fn try_inject(
        &self,
        surface: &dyn ScriptSurface,
        descriptor: &EngineDescriptor,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> InjectionReport {
        self.attempt(surface, descriptor, prompt, cancel, FallbackPolicy::Degrade, 1)
            .await
    }

    /// Run attempt number `attempt_no` under the given fallback policy.
    ///
    /// Guarantee for a non-cancelled degradable attempt: exactly one of
    /// {in-page value set, clipboard written} occurs, never both and never
    /// neither.
    pub(crate) async fn attempt(
        &self,
        surface: &dyn ScriptSurface,
        descriptor: &EngineDescriptor,
        prompt: &str,
        cancel: &CancellationToken,
        policy: FallbackPolicy,
        attempt_no: u32,
    ) -> InjectionReport {
        debug!(
            engine = %descriptor.name,
            attempt = attempt_no,
            prompt = %redact_text(prompt, self.config.redact_logs),
            "starting injection attempt"
        );

        // Settle delay before any evaluation. Cancellation is honored only
        // up to script dispatch.
        let settle = Duration::from_millis(descriptor.settle_delay_ms);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(engine = %descriptor.name, "attempt cancelled before dispatch");
                self.metrics.lock().record_cancellation();
                return InjectionReport::failed(
                    InjectionError::Cancelled.to_string(),
                    attempt_no.saturating_sub(1),
                );
            }
            _ = tokio::time::sleep(settle) => {}
        }

        self.metrics.lock().record_attempt();

        let strategy = DomTargetStrategy::for_descriptor(descriptor);
        let script = InjectionScriptBuilder::from_config(&strategy, &self.config)
            .build(&escape_for_script(prompt));

        let timeout = Duration::from_millis(self.config.evaluate_timeout_ms);
        let verdict = match tokio::time::timeout(timeout, surface.evaluate(&script)).await {
            Err(_) => Err(InjectionError::EvaluateTimeout {
                elapsed_ms: self.config.evaluate_timeout_ms,
            }),
            Ok(Err(e)) => Err(InjectionError::ScriptException(e.to_string())),
            Ok(Ok(token)) => classify_token(&token),
        };

        match verdict {
            Ok(detail) => {
                debug!(engine = %descriptor.name, attempt = attempt_no, %detail, "value set confirmed");
                self.metrics.lock().record_success();
                InjectionReport::success(detail, attempt_no)
            }
            Err(err) => {
                debug!(engine = %descriptor.name, attempt = attempt_no, error = %err, "attempt failed");
                match policy {
                    FallbackPolicy::Report => {
                        self.metrics.lock().record_failure();
                        InjectionReport::failed(err.to_string(), attempt_no)
                    }
                    FallbackPolicy::Degrade => self.degrade_to_clipboard(prompt, err, attempt_no),
                }
            }
        }
    }

    /// Write the verbatim, un-escaped prompt to the OS clipboard once and
    /// fold the original error into the report.
    fn degrade_to_clipboard(
        &self,
        prompt: &str,
        original: InjectionError,
        attempt_no: u32,
    ) -> InjectionReport {
        match self.clipboard.write_text(prompt) {
            Ok(()) => {
                debug!(error = %original, "injection degraded to clipboard");
                self.metrics.lock().record_clipboard_fallback();
                InjectionReport::fallback(original.to_string(), attempt_no)
            }
            Err(ClipboardError::Backend(reason)) => {
                warn!(%reason, "clipboard fallback failed; nothing was delivered");
                self.metrics.lock().record_failure();
                InjectionReport::failed(
                    InjectionError::Clipboard(reason).to_string(),
                    attempt_no,
                )
            }
        }
    }
}

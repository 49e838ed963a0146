//! # Retry coordinator.
//!
//! Wraps the executor in a bounded retry loop with linear backoff: up to
//! `max_attempts` serialized attempts, stopping at the first confirmed
//! success, waiting `retry_backoff_ms × attemptNumber` between failures.
//! Only the final attempt may degrade to the clipboard, so a flow writes
//! the clipboard at most once. The folded result is always `Success` or
//! `FallbackClipboard` unless the flow was cancelled or the clipboard
//! itself failed.

use crate::executor::{FallbackPolicy, InjectionExecutor};
use crate::outcome::InjectionReport;
use crate::ScriptSurface;
use promptcast_engines::EngineDescriptor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct RetryCoordinator {
    executor: InjectionExecutor,
}

impl RetryCoordinator {
    pub fn new(executor: InjectionExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &InjectionExecutor {
        &self.executor
    }

    /// Run the bounded retry loop for one request. The caller must have
    /// confirmed navigation success and armed the page latch before
    /// invoking this; the coordinator itself runs at most once per page
    /// instance.
    pub async fn inject_with_retry(
        &self,
        surface: &dyn ScriptSurface,
        descriptor: &EngineDescriptor,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> InjectionReport {
        let max_attempts = self.executor.config().max_attempts.max(1);
        let backoff_unit = self.executor.config().retry_backoff_ms;
        let mut last = InjectionReport::failed("no attempt ran", 0);

        for attempt_no in 1..=max_attempts {
            let policy = if attempt_no == max_attempts {
                FallbackPolicy::Degrade
            } else {
                FallbackPolicy::Report
            };

            let report = self
                .executor
                .attempt(surface, descriptor, prompt, cancel, policy, attempt_no)
                .await;

            if report.is_success() || report.is_cancelled() {
                return report;
            }
            last = report;

            if attempt_no < max_attempts {
                let backoff = Duration::from_millis(backoff_unit * u64::from(attempt_no));
                debug!(
                    engine = %descriptor.name,
                    attempt = attempt_no,
                    backoff_ms = backoff.as_millis() as u64,
                    "attempt failed, backing off before retry"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return InjectionReport::failed("Cancelled", attempt_no);
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }

        last
    }
}

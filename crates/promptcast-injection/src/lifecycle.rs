//! # Page lifecycle controller.
//!
//! Sequences one page load: navigation gate, retry loop, guard
//! installation, history record, user notice. The controller is stateless
//! across pages; all per-page state lives in the [`PageSession`] the
//! caller owns, so multi-page scenarios and re-entrancy stay explicit.

use crate::config::InjectionConfig;
use crate::error::InjectionError;
use crate::executor::InjectionExecutor;
use crate::guard::PostInjectionGuard;
use crate::history::{HistoryEntry, HistorySink};
use crate::metrics::InjectionMetrics;
use crate::outcome::{InjectionReport, InjectionStatus};
use crate::retry::RetryCoordinator;
use crate::session::{PageSession, PageState};
use crate::{Clipboard, ScriptSurface};
use parking_lot::Mutex;
use promptcast_engines::{DomTargetStrategy, EngineDescriptor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One-way notification boundary to whatever UI hosts the flow.
pub trait UserNotifier: Send + Sync {
    /// The flow degraded to the clipboard; tell the user to paste
    /// manually. Called at most once per flow.
    fn clipboard_fallback(&self, engine_name: &str);
}

/// Notifier that only logs. For tests and headless runs.
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn clipboard_fallback(&self, engine_name: &str) {
        info!(engine = %engine_name, "prompt copied to clipboard; paste it manually");
    }
}

pub struct PageLifecycleController {
    coordinator: RetryCoordinator,
    guard: PostInjectionGuard,
    history: Arc<dyn HistorySink>,
    notifier: Arc<dyn UserNotifier>,
    metrics: Arc<Mutex<InjectionMetrics>>,
}

impl PageLifecycleController {
    pub fn new(
        config: InjectionConfig,
        clipboard: Arc<dyn Clipboard>,
        history: Arc<dyn HistorySink>,
        notifier: Arc<dyn UserNotifier>,
        metrics: Arc<Mutex<InjectionMetrics>>,
    ) -> Self {
        let executor = InjectionExecutor::new(config.clone(), clipboard, Arc::clone(&metrics));
        Self {
            coordinator: RetryCoordinator::new(executor),
            guard: PostInjectionGuard::new(config),
            history,
            notifier,
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<Mutex<InjectionMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Navigation started: show the loading state. Ignored for sessions
    /// already past `Idle` (in-page redirects restart loading on the same
    /// instance).
    pub fn on_navigation_started(&self, session: &mut PageSession) {
        if session.state() == PageState::Idle {
            if let Err(e) = session.transition(PageState::Loading) {
                warn!(error = %e, "unexpected transition on navigation start");
            }
        } else {
            debug!(state = %session.state(), "navigation start ignored for active session");
        }
    }

    /// Navigation completed: gate on the success code, run the retry loop
    /// once per page instance, arm the guard on success, record the
    /// outcome, notify on fallback.
    ///
    /// Returns `None` when the event was ignored (latch already armed or
    /// session terminal), otherwise the folded report.
    pub async fn on_navigation_completed(
        &self,
        session: &mut PageSession,
        surface: &dyn ScriptSurface,
        descriptor: &EngineDescriptor,
        prompt: &str,
        nav_ok: bool,
        cancel: &CancellationToken,
    ) -> Option<InjectionReport> {
        if session.latched() || session.is_terminal() {
            debug!(
                engine = %descriptor.name,
                state = %session.state(),
                "navigation event ignored; injection already ran for this page instance"
            );
            self.metrics.lock().record_latch_suppressed();
            return None;
        }

        // A completed event without a preceding start still passes through
        // the loading state so the machine stays linear.
        if session.state() == PageState::Idle {
            if let Err(e) = session.transition(PageState::Loading) {
                warn!(error = %e, "unexpected transition on navigation complete");
            }
        }

        if !nav_ok {
            if let Err(e) = session.transition(PageState::NavigationFailed) {
                warn!(error = %e, "unexpected transition on navigation failure");
            }
            self.metrics.lock().record_navigation_failure();
            info!(engine = %descriptor.name, "navigation failed; no injection attempted");
            return Some(InjectionReport::failed(
                InjectionError::NavigationFailed.to_string(),
                0,
            ));
        }

        session.arm_latch();
        if let Err(e) = session.transition(PageState::Injecting) {
            warn!(error = %e, "unexpected transition into injection");
        }

        let report = self
            .coordinator
            .inject_with_retry(surface, descriptor, prompt, cancel)
            .await;

        match report.status {
            InjectionStatus::Success => {
                if let Err(e) = session.transition(PageState::Injected) {
                    warn!(error = %e, "unexpected transition after success");
                }
                let strategy = DomTargetStrategy::for_descriptor(descriptor);
                match self.guard.install(surface, &strategy, cancel).await {
                    Ok(()) => {
                        self.metrics.lock().record_guard_install();
                        if let Err(e) = session.transition(PageState::GuardInstalled) {
                            warn!(error = %e, "unexpected transition after guard install");
                        }
                    }
                    Err(e) => {
                        warn!(engine = %descriptor.name, error = %e, "echo guard installation failed");
                        self.metrics.lock().record_guard_install_failure();
                    }
                }
            }
            InjectionStatus::FallbackClipboard => {
                if let Err(e) = session.transition(PageState::ClipboardFallback) {
                    warn!(error = %e, "unexpected transition after fallback");
                }
                self.notifier.clipboard_fallback(&descriptor.name);
            }
            InjectionStatus::Failed => {
                debug!(engine = %descriptor.name, error = ?report.error, "flow ended without delivery");
            }
        }

        let entry = HistoryEntry {
            engine_name: descriptor.name.clone(),
            success: report.is_success(),
            used_fallback: report.used_fallback(),
            status: report.status.to_string(),
        };
        if let Err(e) = self.history.record(entry) {
            warn!(error = %e, "failed to record execution history");
            self.metrics.lock().record_history_write_failure();
        }
        if let Err(e) = session.transition(PageState::Recorded) {
            warn!(error = %e, "unexpected transition into recorded");
        }

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::history::NullHistorySink;
    use crate::MockClipboard;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedSurface {
        tokens: Mutex<VecDeque<&'static str>>,
        calls: AtomicU32,
    }

    impl ScriptedSurface {
        fn new(tokens: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                tokens: Mutex::new(tokens.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ScriptSurface for ScriptedSurface {
        async fn evaluate(&self, _script: &str) -> Result<String, SurfaceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let token = self
                .tokens
                .lock()
                .pop_front()
                .expect("surface evaluated more often than scripted");
            Ok(token.to_string())
        }
    }

    struct CountingNotifier {
        notices: AtomicU32,
    }

    impl UserNotifier for CountingNotifier {
        fn clipboard_fallback(&self, _engine_name: &str) {
            self.notices.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn descriptor() -> EngineDescriptor {
        EngineDescriptor::new("test", "https://chat.example.com/", "#composer", "#send-btn", 0)
    }

    fn controller(clipboard: MockClipboard, notifier: Arc<CountingNotifier>) -> PageLifecycleController {
        PageLifecycleController::new(
            InjectionConfig::default(),
            Arc::new(clipboard),
            Arc::new(NullHistorySink),
            notifier,
            Arc::new(Mutex::new(InjectionMetrics::default())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_failure_short_circuits_without_attempts() {
        let mut clipboard = MockClipboard::new();
        clipboard.expect_write_text().times(0);
        let notifier = Arc::new(CountingNotifier {
            notices: AtomicU32::new(0),
        });
        let controller = controller(clipboard, Arc::clone(&notifier));
        let surface = ScriptedSurface::new(Vec::<&'static str>::new());
        let mut session = PageSession::new("test");
        let cancel = CancellationToken::new();

        controller.on_navigation_started(&mut session);
        let report = controller
            .on_navigation_completed(&mut session, &surface, &descriptor(), "hi", false, &cancel)
            .await
            .unwrap();

        assert_eq!(report.status, InjectionStatus::Failed);
        assert_eq!(report.attempts, 0);
        assert_eq!(surface.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state(), PageState::NavigationFailed);
        assert_eq!(notifier.notices.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_notifies_once_and_skips_the_guard() {
        let mut clipboard = MockClipboard::new();
        clipboard.expect_write_text().times(1).returning(|_| Ok(()));
        let notifier = Arc::new(CountingNotifier {
            notices: AtomicU32::new(0),
        });
        let controller = controller(clipboard, Arc::clone(&notifier));
        let surface = ScriptedSurface::new([
            "error:input-not-found",
            "error:input-not-found",
            "error:input-not-found",
        ]);
        let mut session = PageSession::new("test");
        let cancel = CancellationToken::new();

        controller.on_navigation_started(&mut session);
        let report = controller
            .on_navigation_completed(&mut session, &surface, &descriptor(), "hi", true, &cancel)
            .await
            .unwrap();

        assert!(report.used_fallback());
        // Three attempts, no guard evaluation afterwards.
        assert_eq!(surface.calls.load(Ordering::SeqCst), 3);
        assert_eq!(notifier.notices.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), PageState::Recorded);
    }
}

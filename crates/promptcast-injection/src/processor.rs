//! # Async injection processor.
//!
//! Event-loop wrapper around the lifecycle controller. It receives
//! injection requests and page lifecycle events over channels, owns the
//! session for the current page instance, and forwards each folded report
//! to the caller. One processor serves one embedded browser surface.

use crate::config::InjectionConfig;
use crate::history::HistorySink;
use crate::lifecycle::{PageLifecycleController, UserNotifier};
use crate::metrics::InjectionMetrics;
use crate::outcome::InjectionReport;
use crate::session::PageSession;
use crate::{Clipboard, InjectionRequest, ScriptSurface};
use parking_lot::Mutex;
use promptcast_engines::{EngineDescriptor, EngineRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Lifecycle events of the hosted page, as reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    NavigationStarted,
    NavigationCompleted { success: bool },
}

pub struct AsyncInjectionProcessor {
    controller: PageLifecycleController,
    registry: EngineRegistry,
    surface: Arc<dyn ScriptSurface>,
    request_rx: mpsc::Receiver<InjectionRequest>,
    event_rx: mpsc::Receiver<PageEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    report_tx: mpsc::Sender<InjectionReport>,
    cancel: CancellationToken,
    metrics: Arc<Mutex<InjectionMetrics>>,
    /// Request waiting for (or being served by) a page navigation.
    pending: Option<(InjectionRequest, EngineDescriptor)>,
    /// Session for the current page-load instance.
    session: Option<PageSession>,
}

impl AsyncInjectionProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: InjectionConfig,
        registry: EngineRegistry,
        surface: Arc<dyn ScriptSurface>,
        clipboard: Arc<dyn Clipboard>,
        history: Arc<dyn HistorySink>,
        notifier: Arc<dyn UserNotifier>,
        request_rx: mpsc::Receiver<InjectionRequest>,
        event_rx: mpsc::Receiver<PageEvent>,
        shutdown_rx: mpsc::Receiver<()>,
        report_tx: mpsc::Sender<InjectionReport>,
    ) -> Self {
        let metrics = Arc::new(Mutex::new(InjectionMetrics::default()));
        let controller = PageLifecycleController::new(
            config,
            clipboard,
            history,
            notifier,
            Arc::clone(&metrics),
        );
        Self {
            controller,
            registry,
            surface,
            request_rx,
            event_rx,
            shutdown_rx,
            report_tx,
            cancel: CancellationToken::new(),
            metrics,
            pending: None,
            session: None,
        }
    }

    /// Token that aborts a pending attempt (before script dispatch).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Shared metrics handle for external monitoring.
    pub fn metrics(&self) -> Arc<Mutex<InjectionMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Run the event loop until shutdown.
    pub async fn run(mut self) {
        info!("Injection processor started.");
        loop {
            tokio::select! {
                Some(request) = self.request_rx.recv() => {
                    self.handle_request(request);
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event).await;
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received. Exiting injection processor.");
                    break;
                }
                else => break,
            }
        }
    }

    fn handle_request(&mut self, request: InjectionRequest) {
        match self.registry.get(&request.engine_name) {
            Ok(descriptor) => {
                info!(engine = %request.engine_name, "injection request accepted; waiting for navigation");
                let descriptor = descriptor.clone();
                self.pending = Some((request, descriptor));
                self.session = None;
            }
            Err(e) => {
                error!(error = %e, "injection request rejected");
            }
        }
    }

    async fn handle_event(&mut self, event: PageEvent) {
        let Some((request, descriptor)) = self.pending.as_ref() else {
            debug!(?event, "page event with no pending request");
            return;
        };
        let request = request.clone();
        let descriptor = descriptor.clone();

        match event {
            PageEvent::NavigationStarted => {
                // A fresh page-load instance gets a fresh session (and with
                // it a fresh latch); a redirect inside an active load keeps
                // the current one.
                let fresh = match &self.session {
                    None => true,
                    Some(session) => session.is_terminal(),
                };
                if fresh {
                    self.session = Some(PageSession::new(request.engine_name.clone()));
                }
                if let Some(session) = self.session.as_mut() {
                    self.controller.on_navigation_started(session);
                }
            }
            PageEvent::NavigationCompleted { success } => {
                if self.session.is_none() {
                    self.session = Some(PageSession::new(request.engine_name.clone()));
                }
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                let report = self
                    .controller
                    .on_navigation_completed(
                        session,
                        self.surface.as_ref(),
                        &descriptor,
                        &request.prompt_text,
                        success,
                        &self.cancel,
                    )
                    .await;
                if let Some(report) = report {
                    if self.report_tx.send(report).await.is_err() {
                        debug!("report receiver dropped");
                    }
                }
            }
        }
    }
}

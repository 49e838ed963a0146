//! Runtime wiring: registry assembly, collaborator adapters, the
//! processor task, and the delivery of a single request.

use crate::clipboard::{SystemClipboard, UnavailableClipboard};
use crate::config::AppConfig;
use crate::history::JsonlHistorySink;
use crate::notify::ConsoleNotifier;
use promptcast_engines::EngineRegistry;
use promptcast_foundation::{AppError, AppState, StateManager};
use promptcast_injection::{
    AsyncInjectionProcessor, Clipboard, HistorySink, InjectionRequest, InjectionStatus,
    NullHistorySink, ScriptSurface,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[cfg(not(feature = "cdp"))]
use promptcast_injection::PageEvent;

pub struct RuntimeOptions {
    pub engine_name: String,
    pub prompt_text: String,
    pub config: AppConfig,
}

/// Deliver one prompt to one engine page, end to end.
pub async fn run(options: RuntimeOptions) -> Result<(), AppError> {
    let state = StateManager::new();

    let mut registry = EngineRegistry::builtin();
    registry.merge(options.config.engines.clone());
    let descriptor = registry
        .get(&options.engine_name)
        .map_err(|_| AppError::UnknownEngine(options.engine_name.clone()))?
        .clone();

    let clipboard: Arc<dyn Clipboard> = match SystemClipboard::new() {
        Ok(clipboard) => Arc::new(clipboard),
        Err(e) => {
            warn!(error = %e, "system clipboard unavailable");
            Arc::new(UnavailableClipboard)
        }
    };

    let history: Arc<dyn HistorySink> = match &options.config.history_path {
        Some(path) => {
            let sink =
                JsonlHistorySink::open(path).map_err(|e| AppError::Config(e.to_string()))?;
            info!(path = %sink.path().display(), "execution history enabled");
            Arc::new(sink)
        }
        None => Arc::new(NullHistorySink),
    };

    #[allow(unused_mut)]
    let mut injection_config = options.config.injection.clone();
    #[cfg(not(feature = "cdp"))]
    {
        // Without a browser there is no page to retry against; one attempt
        // degrades straight to the clipboard.
        injection_config.max_attempts = 1;
    }

    let (request_tx, request_rx) = mpsc::channel(4);
    let (event_tx, event_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let (report_tx, mut report_rx) = mpsc::channel(4);

    #[cfg(feature = "cdp")]
    let host = crate::surface::cdp::CdpHost::launch().await?;
    #[cfg(feature = "cdp")]
    let cdp_surface = Arc::new(host.open_page().await?);
    #[cfg(feature = "cdp")]
    let surface: Arc<dyn ScriptSurface> = cdp_surface.clone();

    #[cfg(not(feature = "cdp"))]
    let surface: Arc<dyn ScriptSurface> = Arc::new(crate::surface::DetachedSurface);

    let processor = AsyncInjectionProcessor::new(
        injection_config,
        registry,
        surface,
        clipboard,
        history,
        Arc::new(ConsoleNotifier),
        request_rx,
        event_rx,
        shutdown_rx,
        report_tx,
    );
    let cancel = processor.cancellation_token();
    let metrics = processor.metrics();
    let processor_handle = tokio::spawn(processor.run());

    state.transition(AppState::Running)?;

    request_tx
        .send(InjectionRequest::new(
            options.engine_name.clone(),
            options.prompt_text.clone(),
        ))
        .await
        .map_err(|e| AppError::Fatal(e.to_string()))?;

    #[cfg(feature = "cdp")]
    cdp_surface.navigate(&descriptor.base_url, &event_tx).await;

    #[cfg(not(feature = "cdp"))]
    {
        info!(
            engine = %descriptor.name,
            "built without the cdp feature; delivering through the clipboard path"
        );
        let _ = event_tx.send(PageEvent::NavigationStarted).await;
        let _ = event_tx
            .send(PageEvent::NavigationCompleted { success: true })
            .await;
    }

    // Ctrl+C before the flow finishes cancels the pending attempt; the
    // processor then reports the cancelled flow.
    let report = tokio::select! {
        maybe = report_rx.recv() => maybe,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, cancelling delivery");
            cancel.cancel();
            report_rx.recv().await
        }
    };

    let delivered = match report {
        Some(report) => {
            match report.status {
                InjectionStatus::Success => {
                    println!("Prompt delivered to {}.", descriptor.name);
                }
                InjectionStatus::FallbackClipboard => {
                    // The notifier already printed the manual-paste notice.
                }
                InjectionStatus::Failed => {
                    eprintln!(
                        "Delivery failed: {}",
                        report.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            report.is_success()
        }
        None => {
            warn!("processor ended without a report");
            false
        }
    };

    {
        let snapshot = metrics.lock().clone();
        info!(
            attempts = snapshot.attempts,
            successes = snapshot.successes,
            fallbacks = snapshot.clipboard_fallbacks,
            "delivery finished"
        );
    }

    #[cfg(feature = "cdp")]
    {
        if delivered {
            info!("Browser stays open for the chat session; press Ctrl+C to exit.");
            let _ = tokio::signal::ctrl_c().await;
        }
        host.close().await;
    }
    #[cfg(not(feature = "cdp"))]
    let _ = delivered;

    let _ = shutdown_tx.send(()).await;
    let _ = processor_handle.await;

    state.transition(AppState::Stopping)?;
    state.transition(AppState::Stopped)?;
    Ok(())
}

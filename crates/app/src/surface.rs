//! Embedded browser surfaces.
//!
//! The real surface drives a Chrome instance over CDP and is gated behind
//! the `cdp` feature to keep the heavy dependency optional. Without it the
//! application runs with [`DetachedSurface`], whose evaluations always
//! fail, so every delivery degrades to the clipboard path.

use async_trait::async_trait;
use promptcast_injection::{ScriptSurface, SurfaceError};

/// Surface with no page behind it. Evaluation always fails.
pub struct DetachedSurface;

#[async_trait]
impl ScriptSurface for DetachedSurface {
    async fn evaluate(&self, _script: &str) -> Result<String, SurfaceError> {
        Err(SurfaceError::Detached)
    }

    fn surface_name(&self) -> &'static str {
        "detached"
    }
}

#[cfg(feature = "cdp")]
pub mod cdp {
    //! Chrome-backed surface over the DevTools protocol.

    use super::*;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use promptcast_foundation::AppError;
    use promptcast_injection::PageEvent;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tracing::{debug, info};

    /// One Chrome process plus its CDP handler task.
    pub struct CdpHost {
        browser: Browser,
        handler_task: JoinHandle<()>,
    }

    impl CdpHost {
        /// Launch a headful Chrome; the user finishes the chat in it.
        pub async fn launch() -> Result<Self, AppError> {
            info!("Launching browser...");
            let config = BrowserConfig::builder()
                .with_head()
                .window_size(1280, 900)
                .build()
                .map_err(AppError::Surface)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| AppError::Surface(e.to_string()))?;

            // The handler task pumps CDP messages between us and Chrome.
            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        debug!("CDP handler event loop ended");
                        break;
                    }
                }
            });

            Ok(Self {
                browser,
                handler_task,
            })
        }

        /// Open a blank page. Navigation is a separate step so the caller
        /// can start consuming lifecycle events first.
        pub async fn open_page(&self) -> Result<CdpSurface, AppError> {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| AppError::Surface(e.to_string()))?;
            Ok(CdpSurface { page })
        }

        pub async fn close(mut self) {
            let _ = self.browser.close().await;
            self.handler_task.abort();
        }
    }

    /// Script evaluation on one CDP page.
    pub struct CdpSurface {
        page: chromiumoxide::Page,
    }

    impl CdpSurface {
        /// Navigate to `url` and report the lifecycle on `event_tx`.
        pub async fn navigate(&self, url: &str, event_tx: &mpsc::Sender<PageEvent>) {
            let _ = event_tx.send(PageEvent::NavigationStarted).await;
            let success = match self.page.goto(url).await {
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, %url, "navigation failed");
                    false
                }
            };
            let _ = event_tx
                .send(PageEvent::NavigationCompleted { success })
                .await;
        }
    }

    #[async_trait]
    impl ScriptSurface for CdpSurface {
        async fn evaluate(&self, script: &str) -> Result<String, SurfaceError> {
            let result = self
                .page
                .evaluate(script)
                .await
                .map_err(|e| SurfaceError::Evaluation(e.to_string()))?;
            // The wire contract is a plain string token; anything else is
            // left for the caller to classify as unrecognized.
            Ok(result
                .value()
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_default())
        }

        fn surface_name(&self) -> &'static str {
            "cdp"
        }
    }
}

//! End-to-end pipeline tests: request and page events in, reports out,
//! with hand-rolled surface and clipboard doubles standing in for the
//! embedded browser and the OS clipboard.

use async_trait::async_trait;
use parking_lot::Mutex;
use promptcast_engines::{DomTargetStrategy, EngineDescriptor, EngineRegistry};
use promptcast_injection::{
    AsyncInjectionProcessor, Clipboard, ClipboardError, InjectionConfig, InjectionRequest,
    InjectionScriptBuilder, InjectionStatus, NullHistorySink, PageEvent, ScriptSurface,
    SurfaceError, UserNotifier,
};
use promptcast_injection::escape::escape_for_script;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Surface double that records every evaluated script and answers from a
/// scripted queue of wire tokens.
struct RecordingSurface {
    scripts: Mutex<Vec<String>>,
    tokens: Mutex<VecDeque<Result<String, SurfaceError>>>,
}

impl RecordingSurface {
    fn new(tokens: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
            tokens: Mutex::new(tokens.into_iter().map(|t| Ok(t.to_string())).collect()),
        })
    }

    fn evaluations(&self) -> usize {
        self.scripts.lock().len()
    }

    fn script(&self, index: usize) -> String {
        self.scripts.lock()[index].clone()
    }
}

#[async_trait]
impl ScriptSurface for RecordingSurface {
    async fn evaluate(&self, script: &str) -> Result<String, SurfaceError> {
        self.scripts.lock().push(script.to_string());
        self.tokens
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SurfaceError::Detached))
    }
}

/// Clipboard double counting writes and remembering the last payload.
#[derive(Default)]
struct CountingClipboard {
    writes: AtomicU32,
    last: Mutex<Option<String>>,
}

impl Clipboard for CountingClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct CountingNotifier {
    notices: AtomicU32,
}

impl UserNotifier for CountingNotifier {
    fn clipboard_fallback(&self, _engine_name: &str) {
        self.notices.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_descriptor() -> EngineDescriptor {
    EngineDescriptor::new(
        "testchat",
        "https://chat.example.com/",
        "#composer",
        "#send-btn",
        0,
    )
}

fn test_registry() -> EngineRegistry {
    let mut registry = EngineRegistry::empty();
    registry.insert(test_descriptor());
    registry
}

fn fast_config() -> InjectionConfig {
    InjectionConfig {
        retry_backoff_ms: 10,
        post_submit_settle_ms: 10,
        value_stage_delay_ms: 10,
        submit_stage_delay_ms: 10,
        ..Default::default()
    }
}

struct Pipeline {
    request_tx: mpsc::Sender<InjectionRequest>,
    event_tx: mpsc::Sender<PageEvent>,
    shutdown_tx: mpsc::Sender<()>,
    report_rx: mpsc::Receiver<promptcast_injection::InjectionReport>,
    handle: tokio::task::JoinHandle<()>,
}

fn spawn_pipeline(
    surface: Arc<RecordingSurface>,
    clipboard: Arc<CountingClipboard>,
    notifier: Arc<CountingNotifier>,
) -> Pipeline {
    let (request_tx, request_rx) = mpsc::channel(4);
    let (event_tx, event_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let (report_tx, report_rx) = mpsc::channel(4);

    let processor = AsyncInjectionProcessor::new(
        fast_config(),
        test_registry(),
        surface,
        clipboard,
        Arc::new(NullHistorySink),
        notifier,
        request_rx,
        event_rx,
        shutdown_rx,
        report_tx,
    );
    let handle = tokio::spawn(processor.run());

    Pipeline {
        request_tx,
        event_tx,
        shutdown_tx,
        report_rx,
        handle,
    }
}

async fn recv_report(
    report_rx: &mut mpsc::Receiver<promptcast_injection::InjectionReport>,
) -> promptcast_injection::InjectionReport {
    tokio::time::timeout(Duration::from_secs(5), report_rx.recv())
        .await
        .expect("timed out waiting for a report")
        .expect("report channel closed")
}

#[tokio::test]
async fn happy_path_injects_once_and_arms_the_guard() {
    let surface = RecordingSurface::new(["success:value-set", "success:guard-armed"]);
    let clipboard = Arc::new(CountingClipboard::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut pipeline = spawn_pipeline(Arc::clone(&surface), Arc::clone(&clipboard), notifier);

    pipeline
        .request_tx
        .send(InjectionRequest::new("testchat", "Hello <world>"))
        .await
        .unwrap();
    pipeline.event_tx.send(PageEvent::NavigationStarted).await.unwrap();
    pipeline
        .event_tx
        .send(PageEvent::NavigationCompleted { success: true })
        .await
        .unwrap();

    let report = recv_report(&mut pipeline.report_rx).await;
    assert_eq!(report.status, InjectionStatus::Success);
    assert_eq!(report.attempts, 1);

    // One injection script, one guard script; the guard watches the same
    // cascade the injection used.
    assert_eq!(surface.evaluations(), 2);
    assert!(surface.script(0).contains("Hello <world>"));
    assert!(surface.script(0).contains("#composer"));
    assert!(surface.script(1).contains("MutationObserver"));
    assert!(surface.script(1).contains("#composer"));
    assert_eq!(clipboard.writes.load(Ordering::SeqCst), 0);

    pipeline.shutdown_tx.send(()).await.unwrap();
    pipeline.handle.await.unwrap();
}

#[tokio::test]
async fn repeat_navigation_event_is_ignored_by_the_latch() {
    let surface = RecordingSurface::new(["success:value-set", "success:guard-armed"]);
    let clipboard = Arc::new(CountingClipboard::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut pipeline = spawn_pipeline(Arc::clone(&surface), clipboard, notifier);

    pipeline
        .request_tx
        .send(InjectionRequest::new("testchat", "once only"))
        .await
        .unwrap();
    pipeline.event_tx.send(PageEvent::NavigationStarted).await.unwrap();
    pipeline
        .event_tx
        .send(PageEvent::NavigationCompleted { success: true })
        .await
        .unwrap();
    let report = recv_report(&mut pipeline.report_rx).await;
    assert!(report.is_success());
    let evaluations_after_first = surface.evaluations();

    // An in-page redirect re-reports completion for the same instance.
    pipeline
        .event_tx
        .send(PageEvent::NavigationCompleted { success: true })
        .await
        .unwrap();
    // Let the processor drain the event before asking it to stop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    pipeline.shutdown_tx.send(()).await.unwrap();
    pipeline.handle.await.unwrap();

    assert_eq!(surface.evaluations(), evaluations_after_first);
    assert!(pipeline.report_rx.try_recv().is_err());
}

#[tokio::test]
async fn exhausted_flow_degrades_to_clipboard_and_notifies_once() {
    let surface = RecordingSurface::new([
        "error:input-not-found",
        "error:input-not-found",
        "error:input-not-found",
    ]);
    let clipboard = Arc::new(CountingClipboard::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut pipeline = spawn_pipeline(
        Arc::clone(&surface),
        Arc::clone(&clipboard),
        Arc::clone(&notifier),
    );

    let prompt = "multi\nline \"prompt\" with specials";
    pipeline
        .request_tx
        .send(InjectionRequest::new("testchat", prompt))
        .await
        .unwrap();
    pipeline.event_tx.send(PageEvent::NavigationStarted).await.unwrap();
    pipeline
        .event_tx
        .send(PageEvent::NavigationCompleted { success: true })
        .await
        .unwrap();

    let report = recv_report(&mut pipeline.report_rx).await;
    assert_eq!(report.status, InjectionStatus::FallbackClipboard);
    assert_eq!(report.attempts, 3);

    // Three injection attempts, no guard script afterwards.
    assert_eq!(surface.evaluations(), 3);
    // The clipboard received the verbatim, un-escaped prompt exactly once.
    assert_eq!(clipboard.writes.load(Ordering::SeqCst), 1);
    assert_eq!(clipboard.last.lock().as_deref(), Some(prompt));
    assert_eq!(notifier.notices.load(Ordering::SeqCst), 1);

    pipeline.shutdown_tx.send(()).await.unwrap();
    pipeline.handle.await.unwrap();
}

#[tokio::test]
async fn failed_navigation_runs_zero_attempts_and_no_fallback() {
    let surface = RecordingSurface::new(Vec::<&'static str>::new());
    let clipboard = Arc::new(CountingClipboard::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut pipeline = spawn_pipeline(
        Arc::clone(&surface),
        Arc::clone(&clipboard),
        Arc::clone(&notifier),
    );

    pipeline
        .request_tx
        .send(InjectionRequest::new("testchat", "never delivered"))
        .await
        .unwrap();
    pipeline.event_tx.send(PageEvent::NavigationStarted).await.unwrap();
    pipeline
        .event_tx
        .send(PageEvent::NavigationCompleted { success: false })
        .await
        .unwrap();

    let report = recv_report(&mut pipeline.report_rx).await;
    assert_eq!(report.status, InjectionStatus::Failed);
    assert_eq!(report.attempts, 0);
    assert_eq!(surface.evaluations(), 0);
    assert_eq!(clipboard.writes.load(Ordering::SeqCst), 0);
    assert_eq!(notifier.notices.load(Ordering::SeqCst), 0);

    pipeline.shutdown_tx.send(()).await.unwrap();
    pipeline.handle.await.unwrap();
}

#[test]
fn example_descriptor_script_contains_prompt_and_selectors() {
    let descriptor = EngineDescriptor::new(
        "example",
        "https://chat.example.com/",
        "#composer",
        "#send-btn",
        500,
    );
    let strategy = DomTargetStrategy::for_descriptor(&descriptor);
    let config = InjectionConfig::default();
    let script = InjectionScriptBuilder::from_config(&strategy, &config)
        .build(&escape_for_script("Hello <world>"));

    assert!(script.contains("Hello <world>"));
    assert!(script.contains("#composer"));
    assert!(script.contains("#send-btn"));
    assert!(script.contains("success:value-set"));
}

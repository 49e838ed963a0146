//! OS clipboard adapters for the injection engine's clipboard boundary.

use parking_lot::Mutex;
use promptcast_injection::{Clipboard, ClipboardError};
use tracing::debug;

/// System clipboard via arboard.
pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::Backend(e.to_string()))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .lock()
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Backend(e.to_string()))?;
        debug!("clipboard set ({} chars)", text.len());
        Ok(())
    }
}

/// Stand-in for environments without a clipboard (headless CI, no display
/// server). Always errors so a degraded flow reports `Failed` instead of
/// claiming a clipboard write that never happened.
pub struct UnavailableClipboard;

impl Clipboard for UnavailableClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Backend(
            "no clipboard available in this environment".to_string(),
        ))
    }
}

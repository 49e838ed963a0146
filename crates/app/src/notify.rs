//! User-facing notices from the injection engine.

use promptcast_injection::UserNotifier;
use tracing::info;

/// Prints the one-time fallback notice to stderr so it is visible even
/// when stdout is piped.
pub struct ConsoleNotifier;

impl UserNotifier for ConsoleNotifier {
    fn clipboard_fallback(&self, engine_name: &str) {
        info!(engine = %engine_name, "injection degraded to clipboard");
        eprintln!(
            "Could not inject into {engine_name}. The prompt was copied to the clipboard; paste it into the page manually."
        );
    }
}

use serde::{Deserialize, Serialize};

/// Static per-engine configuration: where the chat page lives, where its
/// composer and submit control are expected, and how long the page needs to
/// settle after navigation before scripts may touch the DOM.
///
/// Descriptors are reference data. They are created once at startup (builtin
/// table plus optional configuration overrides) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    /// Stable engine identifier, e.g. `"chatgpt"`.
    pub name: String,
    /// Page to navigate to before injection.
    pub base_url: String,
    /// Engine-specific selector for the composer input. Tried before the
    /// generic cascade.
    pub input_selector: String,
    /// Engine-specific selector for the submit control. Tried before the
    /// generic cascade.
    pub submit_selector: String,
    /// Wait after navigation completes before the first script dispatch, so
    /// the page's own framework finishes asynchronous setup.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    1500
}

impl EngineDescriptor {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        input_selector: impl Into<String>,
        submit_selector: impl Into<String>,
        settle_delay_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            input_selector: input_selector.into(),
            submit_selector: submit_selector.into(),
            settle_delay_ms,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Configuration for the injection engine.
/// Typically deserialized from the application's TOML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Attempts per request before settling on the final result.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base wait between failed attempts; attempt N waits N times this.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on one script evaluation. A page that never answers
    /// counts as a script failure instead of stalling the flow forever.
    #[serde(default = "default_evaluate_timeout_ms")]
    pub evaluate_timeout_ms: u64,

    /// In-script wait between focusing the composer and setting its value,
    /// so the page's framework can finish wiring the element.
    #[serde(default = "default_value_stage_delay_ms")]
    pub value_stage_delay_ms: u64,

    /// In-script wait between setting the value and clicking submit.
    #[serde(default = "default_submit_stage_delay_ms")]
    pub submit_stage_delay_ms: u64,

    /// Wait after a confirmed success before arming the echo guard.
    #[serde(default = "default_post_submit_settle_ms")]
    pub post_submit_settle_ms: u64,

    /// Whether to redact prompt text in logs.
    #[serde(default = "default_true")]
    pub redact_logs: bool,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_evaluate_timeout_ms() -> u64 {
    15_000
}

fn default_value_stage_delay_ms() -> u64 {
    200
}

fn default_submit_stage_delay_ms() -> u64 {
    600
}

fn default_post_submit_settle_ms() -> u64 {
    1200
}

fn default_true() -> bool {
    true
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            evaluate_timeout_ms: default_evaluate_timeout_ms(),
            value_stage_delay_ms: default_value_stage_delay_ms(),
            submit_stage_delay_ms: default_submit_stage_delay_ms(),
            post_submit_settle_ms: default_post_submit_settle_ms(),
            redact_logs: default_true(),
        }
    }
}

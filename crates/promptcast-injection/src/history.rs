//! # Execution history boundary.
//!
//! The engine records one entry per completed flow into an append-only
//! sink it never reads back. Write failures are reported to the caller and
//! logged, but never fail the flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One completed flow, as recorded in the execution history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub engine_name: String,
    pub success: bool,
    pub used_fallback: bool,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to append history entry: {0}")]
    Append(String),
}

/// Append-only execution history sink.
pub trait HistorySink: Send + Sync {
    fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
}

/// Discards every entry. For tests and headless runs without a history
/// store.
pub struct NullHistorySink;

impl HistorySink for NullHistorySink {
    fn record(&self, _entry: HistoryEntry) -> Result<(), HistoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_stable_field_names() {
        let entry = HistoryEntry {
            engine_name: "chatgpt".to_string(),
            success: true,
            used_fallback: false,
            status: "success".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"engine_name\":\"chatgpt\""));
        assert!(json.contains("\"used_fallback\":false"));
    }
}

//! Append-only JSONL execution history.
//!
//! One line per completed flow. The injection engine only ever writes
//! here; nothing in the application reads it back.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use promptcast_injection::{HistoryEntry, HistoryError, HistorySink};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct TimestampedEntry<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    entry: &'a HistoryEntry,
}

pub struct JsonlHistorySink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlHistorySink {
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| HistoryError::Append(e.to_string()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HistoryError::Append(e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySink for JsonlHistorySink {
    fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let line = serde_json::to_string(&TimestampedEntry {
            timestamp: Utc::now(),
            entry: &entry,
        })
        .map_err(|e| HistoryError::Append(e.to_string()))?;

        let mut file = self.file.lock();
        writeln!(file, "{line}").map_err(|e| HistoryError::Append(e.to_string()))?;
        file.flush().map_err(|e| HistoryError::Append(e.to_string()))
    }
}

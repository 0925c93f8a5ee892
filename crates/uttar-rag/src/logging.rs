//! Structured per-query logging.
//!
//! One JSON line per answered query: the routing decision, token counts,
//! and latency. Log failures are swallowed; they must never abort a
//! request.

use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::Classification;

#[derive(Debug, Clone, Serialize)]
pub struct QueryLogRecord {
    pub query: String,
    pub classification: Classification,
    pub model_used: String,
    pub tokens_input: u32,
    pub tokens_output: u32,
    pub latency_ms: u64,
}

pub trait QueryLogger: Send + Sync {
    fn log(&self, record: &QueryLogRecord);
}

/// Appends records to a JSONL file.
pub struct JsonlLogger {
    file: Mutex<File>,
}

impl JsonlLogger {
    /// Open (or create) the log file, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open query log {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl QueryLogger for JsonlLogger {
    fn log(&self, record: &QueryLogRecord) {
        let mut value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize query log record");
                return;
            }
        };
        value["timestamp"] = serde_json::Value::String(chrono::Utc::now().to_rfc3339());

        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{value}") {
            tracing::warn!(error = %e, "failed to write query log record");
        }
    }
}

/// Discards all records; used in tests and when no log file is configured.
pub struct NoopLogger;

impl QueryLogger for NoopLogger {
    fn log(&self, _record: &QueryLogRecord) {}
}

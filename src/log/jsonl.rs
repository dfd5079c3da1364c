//! JSONL (JSON Lines) logging of cycle history
//!
//! Provides append-only logging of per-cycle dispatch outcomes to
//! `log.jsonl`, including which servers were skipped and why.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// One skipped server in a cycle record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Display name of the server (or `<unnamed>`)
    pub server: String,
    /// Why it was skipped
    pub reason: String,
}

/// Represents the outcome of a single polling cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleRecord {
    /// The cycle number (1-indexed)
    pub cycle: u64,
    /// ISO 8601 timestamp of when the cycle ran
    pub timestamp: DateTime<Utc>,
    /// Start of the query window in epoch millis (absent on the baseline cycle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start_ms: Option<i64>,
    /// End of the query window in epoch millis (absent on the baseline cycle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end_ms: Option<i64>,
    /// Servers whose tasks were submitted
    pub dispatched: Vec<String>,
    /// Servers skipped this cycle, with reasons
    pub skipped: Vec<SkippedEntry>,
    /// Number of configured servers at the time of the cycle
    pub target_count: usize,
}

/// JSONL logger for cycle history
///
/// Each line of `log.jsonl` is a JSON object representing one cycle.
pub struct JsonlLogger {
    log_path: PathBuf,
}

impl JsonlLogger {
    /// Create a new JSONL logger
    ///
    /// # Arguments
    /// * `log_dir` - Directory where log.jsonl will be stored
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let log_path = log_dir.join("log.jsonl");

        Ok(Self { log_path })
    }

    /// Append a cycle record to the log
    pub fn append(&self, record: &CycleRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        let json =
            serde_json::to_string(record).context("Failed to serialize cycle record to JSON")?;

        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read all cycle records from the log, in chronological order
    pub fn read_all(&self) -> Result<Vec<CycleRecord>> {
        // If log file doesn't exist yet, return empty vector
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        let mut records = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: CycleRecord = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))?;

            records.push(record);
        }

        Ok(records)
    }

    /// Get the path to the log file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

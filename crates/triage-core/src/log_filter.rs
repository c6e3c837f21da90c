//! Log Filter: failure-signal lines of a result's raw log.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::{LogService, LogSnippet, TriageError};

/// Case-sensitive substrings that mark a line as a failure signal.
///
/// Fixed to keep output bounded; `FAIL` also covers `FAILED`.
pub const FAILURE_PATTERNS: [&str; 4] = ["AssertionError", "FATAL", "Exception", "FAIL"];

/// Fetches a result's log and keeps only failure-signal lines.
pub struct LogFilter {
    logs: Arc<dyn LogService>,
}

impl LogFilter {
    pub fn new(logs: Arc<dyn LogService>) -> Self {
        Self { logs }
    }

    /// Matching lines of the log for `result_name`, in original order.
    ///
    /// An empty snippet means the log exists but carries no recognized
    /// signal. A missing log is `NotFound`.
    pub async fn fetch_log(&self, result_name: &str) -> Result<LogSnippet> {
        if result_name.trim().is_empty() {
            return Err(TriageError::Argument("result name is empty".to_string()));
        }

        let raw = self
            .logs
            .fetch_raw_log(result_name)
            .await?
            .ok_or_else(|| TriageError::NotFound(format!("log for {}", result_name)))?;

        let lines = filter_lines(&raw);
        debug!(
            result_name,
            bytes = raw.len(),
            matched = lines.len(),
            "Filtered log"
        );

        Ok(LogSnippet {
            result_name: result_name.to_string(),
            lines,
        })
    }
}

/// Lines of `raw` containing at least one of [`FAILURE_PATTERNS`].
pub fn filter_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| FAILURE_PATTERNS.iter().any(|p| line.contains(p)))
        .map(str::to_string)
        .collect()
}

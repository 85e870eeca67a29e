//! The issue sink seam
//!
//! Extraction forwards every normalized record to an [`IssueSink`]
//! immediately and independently; what the sink does with it (create a
//! ticket, call the platform keyword, collect for later) is outside this
//! crate. `LogSink` stands in for the platform keyword; `MemorySink`
//! collects records for inspection.

use std::sync::Mutex;

use crate::issue::IssueRecord;

/// Destination for normalized issue records
pub trait IssueSink: Send + Sync {
    /// Forward one issue record to the external tracker.
    fn add_issue(&self, issue: IssueRecord);
}

/// Sink that emits each issue as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl IssueSink for LogSink {
    fn add_issue(&self, issue: IssueRecord) {
        tracing::info!(
            title = %issue.title,
            severity = issue.severity,
            expected = %issue.expected,
            actual = %issue.actual,
            reproduce_hint = %issue.reproduce_hint,
            next_steps = %issue.next_steps,
            details = %issue.details,
            "issue raised"
        );
    }
}

/// Sink that collects records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    issues: Mutex<Vec<IssueRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the collected records.
    pub fn issues(&self) -> Vec<IssueRecord> {
        self.issues.lock().unwrap().clone()
    }

    /// Drain the collected records.
    pub fn take(&self) -> Vec<IssueRecord> {
        std::mem::take(&mut *self.issues.lock().unwrap())
    }

    /// Number of records collected so far.
    pub fn len(&self) -> usize {
        self.issues.lock().unwrap().len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IssueSink for MemorySink {
    fn add_issue(&self, issue: IssueRecord) {
        self.issues.lock().unwrap().push(issue);
    }
}

//! # dynamic-issues-rs
//!
//! Dynamic issue generation for runbook codebundles.
//!
//! Two discovery paths turn command output and dropped files into
//! normalized issue records for an incident-automation platform:
//!
//! 1. File-based: recursively find `issues.json` files under a directory
//!    tree and create one issue per entry.
//! 2. JSON-query: search command output for a configurable trigger
//!    pattern (e.g. `"issuesIdentified": true`) and create issues from
//!    the array under a configurable key, with a line-scan fallback for
//!    JSON embedded in unstructured logs.
//!
//! Records are forwarded to an [`IssueSink`] as they are found; parse
//! failures are logged and skipped so one bad file or line never aborts a
//! scan.

pub mod extractor;
pub mod issue;
pub mod sink;
pub mod trigger;

pub use extractor::{IssueExtractor, SCAN_DIR_ENV};
pub use issue::IssueRecord;
pub use sink::{IssueSink, LogSink, MemorySink};
pub use trigger::{TriggerSpec, TriggerValue};

#[cfg(test)]
mod tests;

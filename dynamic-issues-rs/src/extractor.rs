//! Issue extraction
//!
//! Two discovery paths feed the sink: a recursive scan for `issues.json`
//! files under a directory tree, and inspection of command output that may
//! be (or may merely contain) JSON describing issues behind a trigger
//! condition. Per-file and per-line failures are logged and skipped; they
//! never abort the wider scan.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::issue::IssueRecord;
use crate::sink::IssueSink;
use crate::trigger::TriggerSpec;

/// Environment variable providing the default scan directory
pub const SCAN_DIR_ENV: &str = "CODEBUNDLE_TEMP_DIR";

const ISSUES_FILE_NAME: &str = "issues.json";

/// Where a candidate document came from, for logging
#[derive(Clone, Copy, PartialEq)]
enum TriggerSource {
    /// The whole command output parsed as one JSON document
    Document,
    /// A single JSON line recovered from mixed output
    Line,
}

/// Issue extractor bound to a sink
pub struct IssueExtractor<'a> {
    sink: &'a dyn IssueSink,
}

impl<'a> IssueExtractor<'a> {
    /// Create an extractor forwarding to `sink`.
    pub fn new(sink: &'a dyn IssueSink) -> Self {
        Self { sink }
    }

    /// Scan a directory tree for `issues.json` files and create issues.
    ///
    /// The search is recursive with unbounded depth, which covers cloned
    /// repositories where `issues.json` sits in a subdirectory. `temp_dir`
    /// defaults to `CODEBUNDLE_TEMP_DIR`, then the current directory.
    /// Returns the number of issues created.
    pub fn process_file_based_issues(
        &self,
        temp_dir: Option<&Path>,
        report_data: Option<&str>,
    ) -> usize {
        let root = temp_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(default_scan_dir);

        let mut issue_files = Vec::new();
        for entry in WalkDir::new(&root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable directory entry: {}", err);
                    continue;
                }
            };
            if entry.file_type().is_file() && entry.file_name() == ISSUES_FILE_NAME {
                issue_files.push(entry.into_path());
            }
        }

        let mut issues_created = 0;
        for path in &issue_files {
            let raw = match fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("Failed to process {}: {}", path.display(), err);
                    continue;
                }
            };
            let data: Value = match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(err) => {
                    warn!("Failed to parse {}: {}", path.display(), err);
                    continue;
                }
            };
            issues_created += self.emit_file_issues(data, path, report_data);
        }

        if !issue_files.is_empty() {
            info!(
                "Processed {} issues.json file(s), created {} issue(s)",
                issue_files.len(),
                issues_created
            );
        }

        issues_created
    }

    /// Search command output for a trigger condition and create issues.
    ///
    /// The whole text is parsed as one JSON document first; when that
    /// fails, a line-by-line fallback recovers JSON objects embedded in
    /// otherwise unstructured output. Returns the number of issues
    /// created.
    pub fn process_json_query_issues(
        &self,
        output_text: &str,
        trigger: &TriggerSpec,
        report_data: Option<&str>,
    ) -> usize {
        if output_text.trim().is_empty() {
            info!("No output text provided for JSON query processing");
            return 0;
        }

        match serde_json::from_str::<Value>(output_text) {
            Ok(data) => self.apply_trigger(&data, trigger, report_data, TriggerSource::Document),
            Err(_) => {
                info!("Output is not valid JSON, attempting to find JSON objects in text");
                self.extract_json_from_text(output_text, trigger, report_data)
            }
        }
    }

    /// Fallback: one JSON document per qualifying line.
    fn extract_json_from_text(
        &self,
        text: &str,
        trigger: &TriggerSpec,
        report_data: Option<&str>,
    ) -> usize {
        let mut issues_created = 0;

        for line in text.lines() {
            let line = line.trim();
            if !(line.starts_with('{') || line.starts_with('[')) {
                continue;
            }
            let data: Value = match serde_json::from_str(line) {
                Ok(data) => data,
                Err(err) => {
                    debug!("line is not valid JSON, skipping: {}", err);
                    continue;
                }
            };
            issues_created += self.apply_trigger(&data, trigger, report_data, TriggerSource::Line);
        }

        issues_created
    }

    /// Check the trigger against one document and emit its issues.
    fn apply_trigger(
        &self,
        data: &Value,
        trigger: &TriggerSpec,
        report_data: Option<&str>,
        source: TriggerSource,
    ) -> usize {
        let candidate = data
            .as_object()
            .and_then(|object| object.get(&trigger.trigger_key));
        if !candidate.is_some_and(|value| trigger.trigger_value.matches(value)) {
            if source == TriggerSource::Document {
                info!(
                    "Trigger condition not met: {} != {}",
                    trigger.trigger_key, trigger.trigger_value
                );
            }
            return 0;
        }
        if source == TriggerSource::Document {
            info!(
                "Trigger condition met: {}={}",
                trigger.trigger_key, trigger.trigger_value
            );
        }

        let Some(object) = data.as_object() else {
            return 0;
        };
        let Some(issues_value) = object.get(&trigger.issues_key) else {
            info!(
                "Trigger met but no '{}' key found in JSON output",
                trigger.issues_key
            );
            return 0;
        };

        let entries: Vec<&Value> = match issues_value {
            Value::Object(_) => vec![issues_value],
            Value::Array(list) => list.iter().collect(),
            _ => {
                warn!(
                    "Issues key '{}' does not contain a list or object",
                    trigger.issues_key
                );
                return 0;
            }
        };

        let mut created = 0;
        for entry in entries {
            let Value::Object(raw) = entry else {
                continue;
            };
            let default_details = serde_json::to_string_pretty(entry).ok();
            let issue = IssueRecord::from_object(raw, default_details, report_data);
            match source {
                TriggerSource::Document => {
                    info!("Created issue from JSON query: {}", issue.title)
                }
                TriggerSource::Line => {
                    info!("Created issue from extracted JSON: {}", issue.title)
                }
            }
            self.sink.add_issue(issue);
            created += 1;
        }
        created
    }

    /// Emit every issue object found in one parsed `issues.json` document.
    fn emit_file_issues(&self, data: Value, path: &Path, report_data: Option<&str>) -> usize {
        let entries = match data {
            Value::Object(object) => vec![Value::Object(object)],
            Value::Array(entries) => entries,
            _ => {
                warn!(
                    "Failed to process {}: expected an object or an array of objects",
                    path.display()
                );
                return 0;
            }
        };

        let mut created = 0;
        for entry in &entries {
            let Value::Object(raw) = entry else {
                continue;
            };
            let issue = IssueRecord::from_object(raw, None, report_data);
            info!("Created issue from {}: {}", path.display(), issue.title);
            self.sink.add_issue(issue);
            created += 1;
        }
        created
    }
}

fn default_scan_dir() -> PathBuf {
    env::var(SCAN_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

//! Issue records
//!
//! The normalized unit handed to the issue sink. Records are built from
//! heterogeneous JSON objects with field-level defaults and are never
//! mutated after creation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized issue, ready for the external tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Short issue title
    pub title: String,

    /// Severity, 1 (critical) through 4 (informational)
    pub severity: i64,

    /// What should have been observed
    pub expected: String,

    /// What was actually observed
    pub actual: String,

    /// How to reproduce the finding
    pub reproduce_hint: String,

    /// Suggested remediation steps
    pub next_steps: String,

    /// Free-form diagnostic details
    pub details: String,
}

impl Default for IssueRecord {
    fn default() -> Self {
        Self {
            title: "Issue Detected".to_string(),
            severity: 3,
            expected: "No issues should be present".to_string(),
            actual: "Issue was detected".to_string(),
            reproduce_hint: "Review the issue details".to_string(),
            next_steps: "Investigate and resolve the issue".to_string(),
            details: String::new(),
        }
    }
}

impl IssueRecord {
    /// Build a record from a raw issue object.
    ///
    /// Absent fields take their defaults; `default_details` replaces the
    /// empty-string details default (the JSON-query path passes the
    /// pretty-printed raw object). A non-empty `report_data` is appended
    /// to the details as a command-output block.
    pub fn from_object(
        object: &Map<String, Value>,
        default_details: Option<String>,
        report_data: Option<&str>,
    ) -> Self {
        let defaults = Self::default();

        let mut details = field_string(object, "details")
            .or(default_details)
            .unwrap_or_default();
        if let Some(report) = report_data.filter(|r| !r.is_empty()) {
            details = append_report(&details, report);
        }

        Self {
            title: field_string(object, "title").unwrap_or(defaults.title),
            severity: object
                .get("severity")
                .and_then(coerce_severity)
                .unwrap_or(defaults.severity),
            expected: field_string(object, "expected").unwrap_or(defaults.expected),
            actual: field_string(object, "actual").unwrap_or(defaults.actual),
            reproduce_hint: field_string(object, "reproduce_hint").unwrap_or(defaults.reproduce_hint),
            next_steps: field_string(object, "next_steps").unwrap_or(defaults.next_steps),
            details,
        }
    }
}

/// Read a field as a string: strings verbatim, other non-null values as
/// their JSON rendering, null and absent as `None`.
fn field_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn coerce_severity(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn append_report(details: &str, report: &str) -> String {
    if details.is_empty() {
        format!("--- Command Output ---\n{}", report)
    } else {
        format!("{}\n\n--- Command Output ---\n{}", details, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn absent_fields_take_defaults() {
        let issue = IssueRecord::from_object(&object(json!({"title": "X"})), None, None);
        assert_eq!(issue.title, "X");
        assert_eq!(issue.severity, 3);
        assert_eq!(issue.expected, "No issues should be present");
        assert_eq!(issue.actual, "Issue was detected");
        assert_eq!(issue.reproduce_hint, "Review the issue details");
        assert_eq!(issue.next_steps, "Investigate and resolve the issue");
        assert_eq!(issue.details, "");
    }

    #[test]
    fn provided_fields_win() {
        let raw = json!({
            "title": "Disk pressure",
            "severity": 1,
            "expected": "Disk usage below 80%",
            "actual": "Disk usage at 97%",
            "reproduce_hint": "df -h /var",
            "next_steps": "Expand the volume",
            "details": "node-3 /var at 97%"
        });
        let issue = IssueRecord::from_object(&object(raw), None, None);
        assert_eq!(issue.title, "Disk pressure");
        assert_eq!(issue.severity, 1);
        assert_eq!(issue.details, "node-3 /var at 97%");
    }

    #[test]
    fn default_details_replaces_empty_default_only() {
        let issue = IssueRecord::from_object(
            &object(json!({})),
            Some("pretty-json".to_string()),
            None,
        );
        assert_eq!(issue.details, "pretty-json");

        let issue = IssueRecord::from_object(
            &object(json!({"details": "explicit"})),
            Some("pretty-json".to_string()),
            None,
        );
        assert_eq!(issue.details, "explicit");
    }

    #[test]
    fn report_data_is_appended() {
        let issue = IssueRecord::from_object(
            &object(json!({"details": "base"})),
            None,
            Some("stdout here"),
        );
        assert_eq!(issue.details, "base\n\n--- Command Output ---\nstdout here");

        let issue = IssueRecord::from_object(&object(json!({})), None, Some("stdout here"));
        assert_eq!(issue.details, "--- Command Output ---\nstdout here");

        // Empty report data is ignored.
        let issue = IssueRecord::from_object(&object(json!({})), None, Some(""));
        assert_eq!(issue.details, "");
    }

    #[test]
    fn severity_truncates_floats() {
        let issue = IssueRecord::from_object(&object(json!({"severity": 2.7})), None, None);
        assert_eq!(issue.severity, 2);

        let issue = IssueRecord::from_object(&object(json!({"severity": "high"})), None, None);
        assert_eq!(issue.severity, 3);
    }

    #[test]
    fn non_string_fields_are_rendered_as_json() {
        let issue = IssueRecord::from_object(
            &object(json!({"title": 42, "actual": ["a", "b"]})),
            None,
            None,
        );
        assert_eq!(issue.title, "42");
        assert_eq!(issue.actual, r#"["a","b"]"#);
    }
}

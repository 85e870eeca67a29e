//! Trigger configuration
//!
//! A trigger is a key/value match that gates issue extraction: issues are
//! only collected when the inspected JSON document carries `trigger_key`
//! with exactly the configured value. Trigger values arriving as string
//! literals (the usual case for runbook configuration) are coerced once,
//! so the literal `"true"` and a native boolean behave identically.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed trigger value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerValue {
    /// Boolean match
    Bool(bool),
    /// Integer match
    Int(i64),
    /// Float match
    Float(f64),
    /// String match
    Text(String),
}

impl TriggerValue {
    /// Coerce a string literal.
    ///
    /// `"true"`/`"false"` (case-insensitive) become booleans; otherwise an
    /// integer parse is attempted when the literal has no `.`, a float
    /// parse when it does; anything else stays a string.
    pub fn parse(literal: &str) -> Self {
        if literal.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if literal.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if !literal.contains('.') {
            if let Ok(n) = literal.parse::<i64>() {
                return Self::Int(n);
            }
        } else if let Ok(f) = literal.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Text(literal.to_string())
    }

    /// Exact type-and-value comparison against a JSON value.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Bool(b) => value.as_bool() == Some(*b),
            Self::Int(n) => value.as_i64() == Some(*n),
            Self::Float(f) => value.as_f64() == Some(*f),
            Self::Text(s) => value.as_str() == Some(s.as_str()),
        }
    }
}

impl fmt::Display for TriggerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for TriggerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TriggerValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TriggerValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for TriggerValue {
    fn from(literal: &str) -> Self {
        Self::parse(literal)
    }
}

impl From<String> for TriggerValue {
    fn from(literal: String) -> Self {
        Self::parse(&literal)
    }
}

/// Trigger configuration for one extraction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// The JSON key to check, e.g. `issuesIdentified`
    pub trigger_key: String,

    /// The value that fires the trigger
    pub trigger_value: TriggerValue,

    /// The JSON key holding the issue records, e.g. `issues`
    pub issues_key: String,
}

impl TriggerSpec {
    /// Create a trigger spec. String trigger values are coerced.
    pub fn new(
        trigger_key: impl Into<String>,
        trigger_value: impl Into<TriggerValue>,
        issues_key: impl Into<String>,
    ) -> Self {
        Self {
            trigger_key: trigger_key.into(),
            trigger_value: trigger_value.into(),
            issues_key: issues_key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_literals_coerce_case_insensitively() {
        assert_eq!(TriggerValue::parse("true"), TriggerValue::Bool(true));
        assert_eq!(TriggerValue::parse("True"), TriggerValue::Bool(true));
        assert_eq!(TriggerValue::parse("FALSE"), TriggerValue::Bool(false));
    }

    #[test]
    fn numeric_literals_coerce_by_shape() {
        assert_eq!(TriggerValue::parse("5"), TriggerValue::Int(5));
        assert_eq!(TriggerValue::parse("-3"), TriggerValue::Int(-3));
        assert_eq!(TriggerValue::parse("1.5"), TriggerValue::Float(1.5));
    }

    #[test]
    fn unparseable_literals_stay_text() {
        assert_eq!(
            TriggerValue::parse("warning"),
            TriggerValue::Text("warning".to_string())
        );
        // No dot means no float attempt; a failed integer parse keeps the string.
        assert_eq!(
            TriggerValue::parse("1e5"),
            TriggerValue::Text("1e5".to_string())
        );
        assert_eq!(
            TriggerValue::parse("1.2.3"),
            TriggerValue::Text("1.2.3".to_string())
        );
    }

    #[test]
    fn coerced_literal_matches_like_native_value() {
        let from_literal = TriggerValue::from("true");
        let native = TriggerValue::from(true);
        assert_eq!(from_literal, native);
        assert!(from_literal.matches(&json!(true)));
        assert!(native.matches(&json!(true)));
        assert!(!from_literal.matches(&json!(false)));
        assert!(!from_literal.matches(&json!("true")));
    }

    #[test]
    fn matching_is_type_exact() {
        assert!(TriggerValue::Int(1).matches(&json!(1)));
        assert!(!TriggerValue::Int(1).matches(&json!(true)));
        assert!(!TriggerValue::Int(1).matches(&json!("1")));
        assert!(TriggerValue::Text("1".to_string()).matches(&json!("1")));
        assert!(TriggerValue::Float(1.5).matches(&json!(1.5)));
    }

    #[test]
    fn display_reads_like_the_configured_literal() {
        assert_eq!(TriggerValue::Bool(true).to_string(), "true");
        assert_eq!(TriggerValue::Int(5).to_string(), "5");
        assert_eq!(TriggerValue::Text("on".to_string()).to_string(), "on");
    }
}

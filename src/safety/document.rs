//! Structural threat checks for document-store (MongoDB) candidates.
//!
//! Document filters do not go through the SQL parser; instead the parsed
//! JSON value is walked for operator shapes known to bypass
//! authentication or execute server-side code. The destructive-operation
//! check (delete/update with an empty filter, meaning "match all") is
//! rated critical so it blocks in every strictness mode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::signatures::Detection;
use super::Severity;

/// Document-store operation a filter is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentOperation {
    Find,
    Insert,
    Update,
    Delete,
    Count,
    Aggregate,
}

impl DocumentOperation {
    /// Whether an unconstrained filter would modify or remove documents.
    pub fn is_destructive(self) -> bool {
        matches!(self, DocumentOperation::Update | DocumentOperation::Delete)
    }
}

impl fmt::Display for DocumentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOperation::Find => write!(f, "find"),
            DocumentOperation::Insert => write!(f, "insert"),
            DocumentOperation::Update => write!(f, "update"),
            DocumentOperation::Delete => write!(f, "delete"),
            DocumentOperation::Count => write!(f, "count"),
            DocumentOperation::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// Scan a document filter for structural injection shapes.
pub fn scan_document(filter: &Value, operation: DocumentOperation) -> Detection {
    let mut detection = Detection::default();

    if operation.is_destructive() && is_empty_filter(filter) {
        record(
            &mut detection,
            format!("unconditional {operation}: empty filter matches all documents"),
            Severity::Critical,
        );
    }

    walk(filter, &mut detection);
    detection
}

fn is_empty_filter(filter: &Value) -> bool {
    match filter {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

fn walk(value: &Value, detection: &mut Detection) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                check_key(key, child, detection);
                walk(child, detection);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, detection);
            }
        }
        _ => {}
    }
}

fn check_key(key: &str, child: &Value, detection: &mut Detection) {
    match key {
        "$where" | "eval" => record(
            detection,
            "server-side code execution operator ($where/eval)".to_string(),
            Severity::Critical,
        ),
        "$ne" if is_sentinel(child) => record(
            detection,
            "always-true $ne comparison".to_string(),
            Severity::High,
        ),
        "$or" if has_empty_branch(child) => record(
            detection,
            "empty $or branch matches all documents".to_string(),
            Severity::High,
        ),
        "$regex" if is_match_all_pattern(child) => record(
            detection,
            "match-all $regex pattern".to_string(),
            Severity::Medium,
        ),
        _ => {}
    }
}

/// `$ne` against null or a primitive sentinel matches essentially every
/// document; `$ne` against a concrete string is a legitimate filter.
fn is_sentinel(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Number(_) | Value::Bool(_))
}

fn has_empty_branch(value: &Value) -> bool {
    match value {
        Value::Array(branches) => branches.is_empty() || branches.iter().any(is_empty_filter),
        _ => false,
    }
}

fn is_match_all_pattern(value: &Value) -> bool {
    matches!(value, Value::String(s) if matches!(s.trim(), ".*" | "^.*$" | "(.*)"))
}

fn record(detection: &mut Detection, threat: String, severity: Severity) {
    detection.detected = true;
    detection.threats.push(threat);
    detection.severity = detection.severity.max(severity);
}

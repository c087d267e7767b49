//! Query safety evaluation.
//!
//! This module decides whether a generated query candidate is safe to
//! hand to an executor. Two independent layers feed the decision:
//!
//! - [`syntax`]: parses the candidate into a statement tree and applies
//!   structural rules (DDL blocked, mutation without WHERE blocked,
//!   SELECT without LIMIT warned).
//! - [`signatures`] / [`document`]: scan the raw candidate against a
//!   catalog of known injection signatures, independent of whether the
//!   parse succeeded.
//!
//! [`SafetyPolicy`] combines both layers into a [`SafetyVerdict`] under a
//! configured [`Strictness`] mode. Evaluation is a pure function of the
//! input plus the catalog built at startup; evaluating the same candidate
//! twice yields identical verdicts.

pub mod document;
pub mod signatures;
pub mod syntax;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::SafetyConfig;
use document::DocumentOperation;
use signatures::{Detection, SignatureCatalog};

/// Target query language family for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    Generic,
    MongoDb,
}

impl Dialect {
    /// Whether candidates in this dialect are document filters rather
    /// than SQL text.
    pub fn is_document(self) -> bool {
        matches!(self, Dialect::MongoDb)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Generic => write!(f, "generic"),
            Dialect::MongoDb => write!(f, "mongodb"),
        }
    }
}

/// Severity of a detected threat. Totally ordered so the verdict severity
/// is the maximum over all matched signatures, independent of evaluation
/// order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Blocking mode for injection-detector matches.
///
/// Structural blocks (DDL, mutation without WHERE, empty filter on a
/// destructive document operation) apply in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Any detector match blocks the candidate.
    #[default]
    Strict,
    /// Only critical-severity detector matches block; lower-severity
    /// matches are recorded as advisory reasons.
    Permissive,
}

/// The safety-evaluation result for one candidate. Produced fresh per
/// candidate and never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub valid_syntax: bool,
    pub blocked: bool,
    pub reasons: Vec<String>,
    pub severity: Severity,
}

/// Combines syntax validation and injection detection into accept/block
/// decisions.
///
/// The policy is a pure function of its input plus the signature catalog
/// and strictness mode injected at construction; it holds no per-request
/// state and is safe to share across concurrent requests.
pub struct SafetyPolicy {
    catalog: SignatureCatalog,
    strictness: Strictness,
}

impl SafetyPolicy {
    /// Create a policy with an explicit catalog and strictness mode.
    pub fn new(catalog: SignatureCatalog, strictness: Strictness) -> Self {
        Self {
            catalog,
            strictness,
        }
    }

    /// Create a policy with the built-in catalog and configured strictness.
    pub fn from_config(config: &SafetyConfig) -> Self {
        Self::new(SignatureCatalog::builtin(), config.strictness)
    }

    /// The strictness mode this policy was built with.
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Evaluate a single candidate.
    ///
    /// SQL dialects run the statement inspection and the signature scan
    /// on the raw text. `MongoDb` candidates are parsed as JSON find
    /// filters and checked structurally; use [`Self::evaluate_document`]
    /// for destructive document operations.
    pub fn evaluate(&self, query: &str, dialect: Dialect) -> SafetyVerdict {
        self.evaluate_with(query, dialect, self.strictness)
    }

    /// Evaluate a single candidate under an explicit strictness mode,
    /// for callers whose requests override the configured default.
    pub fn evaluate_with(
        &self,
        query: &str,
        dialect: Dialect,
        strictness: Strictness,
    ) -> SafetyVerdict {
        if dialect.is_document() {
            return self.evaluate_document_text(query, strictness);
        }

        let syntax = syntax::inspect(query, dialect);
        let detection = signatures::scan(&self.catalog, query);

        let mut reasons = syntax.reasons;
        reasons.extend(detection.threats.iter().cloned());

        let blocked = syntax.blocked || detector_blocks(&detection, strictness);
        let verdict = SafetyVerdict {
            valid_syntax: syntax.valid_syntax,
            blocked,
            reasons,
            severity: detection.severity,
        };
        tracing::debug!(
            dialect = %dialect,
            blocked = verdict.blocked,
            severity = %verdict.severity,
            "evaluated candidate"
        );
        verdict
    }

    /// Evaluate a batch of candidates independently, preserving input
    /// order. One candidate's evaluation never affects another's.
    pub fn evaluate_batch(&self, candidates: &[String], dialect: Dialect) -> Vec<SafetyVerdict> {
        candidates
            .iter()
            .map(|query| self.evaluate(query, dialect))
            .collect()
    }

    /// Evaluate a document-store filter against a declared operation.
    pub fn evaluate_document(&self, filter: &Value, operation: DocumentOperation) -> SafetyVerdict {
        let detection = document::scan_document(filter, operation);
        document_verdict(true, detection, self.strictness)
    }

    /// Evaluate a document candidate supplied as raw JSON text, treated
    /// as a find filter.
    fn evaluate_document_text(&self, query: &str, strictness: Strictness) -> SafetyVerdict {
        match serde_json::from_str::<Value>(query) {
            Ok(filter) => {
                let detection = document::scan_document(&filter, DocumentOperation::Find);
                document_verdict(true, detection, strictness)
            }
            Err(e) => SafetyVerdict {
                valid_syntax: false,
                blocked: false,
                reasons: vec![format!("parse_error: {e}")],
                severity: Severity::None,
            },
        }
    }
}

fn document_verdict(
    valid_syntax: bool,
    detection: Detection,
    strictness: Strictness,
) -> SafetyVerdict {
    let blocked = detector_blocks(&detection, strictness);
    SafetyVerdict {
        valid_syntax,
        blocked,
        reasons: detection.threats,
        severity: detection.severity,
    }
}

fn detector_blocks(detection: &Detection, strictness: Strictness) -> bool {
    match strictness {
        Strictness::Strict => detection.detected,
        Strictness::Permissive => detection.severity >= Severity::Critical,
    }
}

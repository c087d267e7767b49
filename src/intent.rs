//! Keyword-based intent inference for natural-language requests.
//!
//! A lightweight lookup over verb keywords, checked in a fixed category
//! order with first match winning. The ranker consumes the inferred
//! intent for its statement-kind bonus; request handlers surface it to
//! callers. Deliberately simple: no model, no tokenizer downloads.

use serde::{Deserialize, Serialize};

use crate::safety::document::DocumentOperation;
use crate::safety::syntax::StatementKind;

/// Coarse intent inferred from a natural-language request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Select,
    Insert,
    Update,
    Delete,
    ApiFetch,
    #[default]
    Other,
}

impl Intent {
    /// Whether a candidate of the given statement kind fulfils this
    /// intent. Delete-flavoured requests also cover DROP/TRUNCATE since
    /// the verb table routes "drop" and "truncate" here.
    pub fn matches(self, kind: StatementKind) -> bool {
        match self {
            Intent::Select => kind == StatementKind::Select,
            Intent::Insert => kind == StatementKind::Insert,
            Intent::Update => kind == StatementKind::Update,
            Intent::Delete => matches!(
                kind,
                StatementKind::Delete | StatementKind::Drop | StatementKind::Truncate
            ),
            Intent::ApiFetch | Intent::Other => false,
        }
    }
}

const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Select,
        &["select", "show", "list", "find", "get", "fetch"],
    ),
    (
        Intent::Insert,
        &["insert", "add", "create", "new", "append"],
    ),
    (Intent::Update, &["update", "modify", "change", "set"]),
    (Intent::Delete, &["delete", "remove", "drop", "truncate"]),
    (Intent::ApiFetch, &["call api", "fetch api", "http", "curl"]),
];

/// Infer the coarse intent of a request. Categories are checked in
/// order; the first category with a keyword hit wins.
pub fn classify_intent(text: &str) -> Intent {
    let text = text.to_lowercase();
    for (intent, keywords) in INTENT_KEYWORDS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return *intent;
        }
    }
    Intent::Other
}

const OPERATION_KEYWORDS: &[(DocumentOperation, &[&str])] = &[
    (
        DocumentOperation::Find,
        &["find", "search", "show", "get", "list", "fetch"],
    ),
    (DocumentOperation::Insert, &["insert", "add", "create"]),
    (
        DocumentOperation::Update,
        &["update", "modify", "change", "set"],
    ),
    (DocumentOperation::Delete, &["delete", "remove"]),
    (DocumentOperation::Count, &["count", "total", "how many"]),
    (
        DocumentOperation::Aggregate,
        &["aggregate", "group", "sum", "average"],
    ),
];

/// Infer the document-store operation a request describes. Defaults to
/// `Find` when nothing matches.
pub fn classify_operation(text: &str) -> DocumentOperation {
    let text = text.to_lowercase();
    for (operation, keywords) in OPERATION_KEYWORDS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return *operation;
        }
    }
    DocumentOperation::Find
}

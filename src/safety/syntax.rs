//! Statement-tree inspection for SQL candidates.
//!
//! Parses a candidate with `sqlparser`, classifies the statement kind,
//! and applies the structural safety rules: DDL is blocked outright,
//! DELETE/UPDATE without a WHERE clause is blocked, and SELECT without a
//! LIMIT gets a soft warning (the executor caps rows at runtime).
//!
//! Parse failures never panic or escape as errors; they are recorded as
//! a `parse_error:`-prefixed reason so the signature scan still runs on
//! the raw text.

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::Dialect;

/// Classified kind of a parsed statement. A closed set: anything the
/// structural rules do not care about maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Other,
}

/// Result of inspecting one candidate's syntax.
#[derive(Debug, Clone)]
pub struct SyntaxReport {
    pub valid_syntax: bool,
    pub kind: Option<StatementKind>,
    pub blocked: bool,
    pub reasons: Vec<String>,
}

/// Parse a candidate and apply the structural safety rules.
pub fn inspect(query: &str, dialect: Dialect) -> SyntaxReport {
    let mut report = SyntaxReport {
        valid_syntax: false,
        kind: None,
        blocked: false,
        reasons: Vec::new(),
    };

    let statements = match parse(query, dialect) {
        Ok(statements) => statements,
        Err(reason) => {
            report.reasons.push(reason);
            return report;
        }
    };

    let Some(first) = statements.first() else {
        report.reasons.push("parse_error: empty statement".to_string());
        return report;
    };

    report.valid_syntax = true;
    let kind = classify(first);
    report.kind = Some(kind);

    match kind {
        StatementKind::Drop | StatementKind::Truncate | StatementKind::Alter => {
            report.blocked = true;
            report.reasons.push("DDL is blocked".to_string());
        }
        StatementKind::Delete => {
            if !has_where(first) {
                report.blocked = true;
                report
                    .reasons
                    .push("DELETE without WHERE is blocked".to_string());
            }
        }
        StatementKind::Update => {
            if !has_where(first) {
                report.blocked = true;
                report
                    .reasons
                    .push("UPDATE without WHERE is blocked".to_string());
            }
        }
        StatementKind::Select => {
            if !has_limit(first) {
                report
                    .reasons
                    .push("SELECT missing LIMIT; will cap at runtime".to_string());
            }
        }
        _ => {}
    }

    report
}

/// Classify the first statement of a candidate, if it parses.
pub fn statement_kind(query: &str, dialect: Dialect) -> Option<StatementKind> {
    parse(query, dialect)
        .ok()
        .and_then(|statements| statements.first().map(classify))
}

fn parse(query: &str, dialect: Dialect) -> Result<Vec<Statement>, String> {
    let result = match dialect {
        Dialect::MySql => Parser::parse_sql(&MySqlDialect {}, query),
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, query),
        Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, query),
        Dialect::Generic | Dialect::MongoDb => Parser::parse_sql(&GenericDialect {}, query),
    };
    result.map_err(|e| format!("parse_error: {e}"))
}

fn classify(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(_) => StatementKind::Select,
        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,
        Statement::Drop { .. } => StatementKind::Drop,
        Statement::Truncate { .. } => StatementKind::Truncate,
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => StatementKind::Alter,
        _ => StatementKind::Other,
    }
}

fn has_where(statement: &Statement) -> bool {
    match statement {
        Statement::Delete(delete) => delete.selection.is_some(),
        Statement::Update { selection, .. } => selection.is_some(),
        _ => false,
    }
}

fn has_limit(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => query.limit.is_some(),
        _ => false,
    }
}

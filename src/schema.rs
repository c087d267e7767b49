//! Schema context supplied by the (external) introspection layer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Names visible in the target database, used for schema-term overlap
/// scoring. A `BTreeMap` keeps iteration deterministic so equal inputs
/// always produce equal heuristic scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaContext {
    /// Table names (SQL) or collection names (document stores).
    pub tables_or_collections: Vec<String>,
    /// Column/field names keyed by their table or collection.
    pub columns_or_fields: BTreeMap<String, Vec<String>>,
}

impl SchemaContext {
    /// Build a context from table/collection names only.
    pub fn from_tables(tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tables_or_collections: tables.into_iter().map(Into::into).collect(),
            columns_or_fields: BTreeMap::new(),
        }
    }

    /// Schema terms with their overlap weights: tables/collections count
    /// full, columns/fields half.
    pub fn weighted_terms(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        let tables = self
            .tables_or_collections
            .iter()
            .map(|t| (t.as_str(), 1.0));
        let columns = self
            .columns_or_fields
            .values()
            .flatten()
            .map(|c| (c.as_str(), 0.5));
        tables.chain(columns)
    }
}

/// Lowercased identifier-ish tokens of a text, for term-overlap checks.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

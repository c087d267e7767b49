//! Threat-signature catalog and raw-text scanning for SQL candidates.
//!
//! Each signature is a named pattern (compiled regex or structural
//! predicate) with a severity. The catalog is built once at startup and
//! injected into the [`SafetyPolicy`](super::SafetyPolicy); signatures
//! match independently and case-insensitively, and the detection severity
//! is the maximum over all matches regardless of evaluation order.
//!
//! Patterns must terminate promptly on any input: the `regex` crate
//! guarantees linear-time matching, and predicates are single scans.

use std::sync::LazyLock;

use regex::Regex;

use super::Severity;

/// How a signature matches candidate text.
pub enum Matcher {
    /// Case-insensitive compiled regular expression.
    Pattern(Regex),
    /// Structural predicate over the raw text.
    Predicate(fn(&str) -> bool),
}

/// A named detection rule for a known attack pattern.
pub struct ThreatSignature {
    pub label: &'static str,
    pub severity: Severity,
    matcher: Matcher,
}

impl ThreatSignature {
    fn pattern(label: &'static str, severity: Severity, pattern: &str) -> Self {
        Self {
            label,
            severity,
            matcher: Matcher::Pattern(
                Regex::new(pattern).expect("invalid builtin signature pattern"),
            ),
        }
    }

    fn predicate(label: &'static str, severity: Severity, predicate: fn(&str) -> bool) -> Self {
        Self {
            label,
            severity,
            matcher: Matcher::Predicate(predicate),
        }
    }

    /// Whether this signature matches the candidate text.
    pub fn matches(&self, query: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(regex) => regex.is_match(query),
            Matcher::Predicate(predicate) => predicate(query),
        }
    }
}

/// Immutable set of threat signatures, loaded once at startup.
pub struct SignatureCatalog {
    signatures: Vec<ThreatSignature>,
}

impl SignatureCatalog {
    /// Build the built-in catalog of SQL injection signatures.
    pub fn builtin() -> Self {
        let signatures = vec![
            ThreatSignature::predicate(
                "multi-statement: stacked queries",
                Severity::High,
                has_stacked_statement,
            ),
            ThreatSignature::pattern(
                "inline comment marker",
                Severity::Medium,
                r"(--|#|/\*)",
            ),
            ThreatSignature::predicate(
                "boolean tautology (always-true condition)",
                Severity::High,
                has_tautology,
            ),
            ThreatSignature::pattern(
                "UNION-based set combination",
                Severity::High,
                r"(?i)\bunion(\s+all)?\s+select\b",
            ),
            ThreatSignature::pattern(
                "time-delay primitive",
                Severity::High,
                r"(?i)(\bsleep\s*\(|\bbenchmark\s*\(|\bwaitfor\s+delay\b)",
            ),
            ThreatSignature::pattern(
                "encoded literal obfuscation",
                Severity::Medium,
                r"(?i)(\b0x[0-9a-f]+\b|\bchar\s*\(\s*\d+\s*(,\s*\d+\s*)*\))",
            ),
            ThreatSignature::pattern(
                "metadata catalog probing",
                Severity::Medium,
                r"(?i)(information_schema|\bsys\s*\.)",
            ),
            ThreatSignature::pattern(
                "file or command primitive",
                Severity::Critical,
                r"(?i)(\bload_file\s*\(|\binto\s+(out|dump)file\b|\bxp_cmdshell\b)",
            ),
            ThreatSignature::pattern(
                "string concatenation with nested SELECT",
                Severity::High,
                r"(?i)(\bconcat\s*\([^)]*\bselect\b|\|\|\s*\(\s*select\b)",
            ),
        ];
        tracing::info!(count = signatures.len(), "loaded builtin signature catalog");
        Self { signatures }
    }

    /// Iterate over the signatures in the catalog.
    pub fn iter(&self) -> impl Iterator<Item = &ThreatSignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Outcome of scanning one candidate against a catalog.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub detected: bool,
    pub threats: Vec<String>,
    pub severity: Severity,
}

/// Scan raw candidate text against every signature in the catalog.
pub fn scan(catalog: &SignatureCatalog, query: &str) -> Detection {
    let mut detection = Detection::default();
    for signature in catalog.iter() {
        if signature.matches(query) {
            detection.detected = true;
            detection.threats.push(signature.label.to_string());
            detection.severity = detection.severity.max(signature.severity);
        }
    }
    detection
}

/// A statement separator anywhere except as the sole terminal punctuation.
fn has_stacked_statement(query: &str) -> bool {
    let trimmed = query.trim_end();
    trimmed
        .char_indices()
        .any(|(i, c)| c == ';' && i + 1 < trimmed.len())
}

static TAUTOLOGY: LazyLock<Regex> = LazyLock::new(|| {
    // The regex engine has no backreferences, so capture both sides of
    // the comparison and compare them in code.
    Regex::new(r"(?i)\b(?:or|and)\s+(?:'([^']*)'|(\d+))\s*=\s*(?:'([^']*)'|(\d+))")
        .expect("invalid tautology pattern")
});

/// `OR 1=1`, `OR 'a'='a'`, `AND '1'='1'` and friends: a boolean operator
/// followed by a literal compared against an identical literal.
fn has_tautology(query: &str) -> bool {
    TAUTOLOGY.captures_iter(query).any(|caps| {
        let left = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        let right = caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str());
        matches!((left, right), (Some(l), Some(r)) if l == r)
    })
}

//! Candidate ranking by semantic similarity and schema heuristics.
//!
//! Candidates that survive the safety filter are ordered by a convex
//! combination of embedding cosine similarity and a rule-based heuristic
//! (schema-term overlap plus a statement-kind/intent bonus). The user
//! text and every candidate are embedded in a single batched model
//! invocation per request.
//!
//! When embedding fails for any reason the ranker falls back to
//! heuristic-only ordering and flags the result as degraded; it never
//! silently substitutes scores.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::embedding::EmbeddingProvider;
use crate::intent::Intent;
use crate::safety::syntax::statement_kind;
use crate::safety::Dialect;
use crate::schema::{tokenize, SchemaContext};

/// One ranked candidate. Derived per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    pub query: String,
    /// Cosine similarity between user text and candidate, in [0, 1].
    pub similarity: f32,
    /// Schema-overlap heuristic with intent bonus, in [0, 1].
    pub heuristic_score: f32,
    /// `similarity_weight * similarity + heuristic_weight * heuristic_score`.
    pub combined_score: f32,
}

/// Ordered ranking result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedQueries {
    pub ranked: Vec<RankEntry>,
    /// True when embedding failed and the order is heuristic-only.
    pub degraded: bool,
}

/// Ranks surviving candidates against the user's request.
///
/// Stateless apart from the injected provider and weights; safe to share
/// across concurrent requests.
pub struct SimilarityRanker {
    embedder: Arc<dyn EmbeddingProvider>,
    config: RankingConfig,
}

impl SimilarityRanker {
    /// Create a ranker with the given provider and validated weights.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: RankingConfig) -> Self {
        Self { embedder, config }
    }

    /// Rank candidates descending by combined score. Ties keep input
    /// order (the sort is stable), so equal-score candidates are never
    /// reordered nondeterministically.
    pub async fn rank(
        &self,
        user_text: &str,
        candidates: &[String],
        schema: &SchemaContext,
        inferred_intent: Option<Intent>,
        dialect: Dialect,
    ) -> RankedQueries {
        if candidates.is_empty() {
            return RankedQueries {
                ranked: Vec::new(),
                degraded: false,
            };
        }

        let heuristics: Vec<f32> = candidates
            .iter()
            .map(|candidate| self.heuristic_score(user_text, candidate, schema, inferred_intent, dialect))
            .collect();

        let (similarities, degraded) = self.similarities(user_text, candidates).await;

        let mut ranked: Vec<RankEntry> = candidates
            .iter()
            .zip(similarities.iter().zip(heuristics.iter()))
            .map(|(candidate, (&similarity, &heuristic_score))| RankEntry {
                query: candidate.clone(),
                similarity,
                heuristic_score,
                combined_score: self.config.similarity_weight * similarity
                    + self.config.heuristic_weight * heuristic_score,
            })
            .collect();

        // Stable sort: equal combined scores keep candidate order.
        ranked.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        RankedQueries { ranked, degraded }
    }

    /// Embed user text and candidates in one batched invocation; fall
    /// back to zero similarity for every candidate on failure.
    async fn similarities(&self, user_text: &str, candidates: &[String]) -> (Vec<f32>, bool) {
        let mut inputs = Vec::with_capacity(candidates.len() + 1);
        inputs.push(user_text.to_string());
        inputs.extend(candidates.iter().map(|c| normalize_candidate(c)));

        match self.embedder.embed(&inputs).await {
            Ok(vectors) if vectors.len() == inputs.len() => {
                let mut vectors = vectors.into_iter();
                let user_vector = vectors.next().unwrap_or_default();
                let similarities = vectors
                    .map(|v| cosine_similarity(&user_vector, &v).clamp(0.0, 1.0))
                    .collect();
                (similarities, false)
            }
            Ok(vectors) => {
                tracing::warn!(
                    expected = inputs.len(),
                    got = vectors.len(),
                    "embedding returned wrong count; ranking degraded to heuristics"
                );
                (vec![0.0; candidates.len()], true)
            }
            Err(e) => {
                tracing::warn!("embedding unavailable, ranking degraded to heuristics: {e}");
                (vec![0.0; candidates.len()], true)
            }
        }
    }

    /// Weighted schema-term overlap plus an intent bonus, in [0, 1].
    ///
    /// Only schema terms the user actually mentioned count; the overlap
    /// is the mentioned weight also present in the candidate, normalized
    /// by the total mentioned weight.
    fn heuristic_score(
        &self,
        user_text: &str,
        candidate: &str,
        schema: &SchemaContext,
        inferred_intent: Option<Intent>,
        dialect: Dialect,
    ) -> f32 {
        let user_tokens = tokenize(user_text);
        let candidate_tokens = tokenize(candidate);

        let mut mentioned_weight = 0.0_f32;
        let mut matched_weight = 0.0_f32;
        for (term, weight) in schema.weighted_terms() {
            let term = term.to_lowercase();
            if user_tokens.contains(&term) {
                mentioned_weight += weight;
                if candidate_tokens.contains(&term) {
                    matched_weight += weight;
                }
            }
        }
        let overlap = if mentioned_weight > 0.0 {
            matched_weight / mentioned_weight
        } else {
            0.0
        };

        let bonus = match inferred_intent {
            Some(intent) => match statement_kind(candidate, dialect) {
                Some(kind) if intent.matches(kind) => self.config.intent_bonus,
                _ => 0.0,
            },
            None => 0.0,
        };

        (overlap + bonus).clamp(0.0, 1.0)
    }
}

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(?:[^']|'')*'").expect("invalid literal pattern"));
static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(\.\d+)?\b").expect("invalid numeric pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Strip literals and collapse whitespace so embeddings emphasize the
/// structural terms of a candidate rather than its constants.
fn normalize_candidate(candidate: &str) -> String {
    let stripped = STRING_LITERAL.replace_all(candidate, "?");
    let stripped = NUMERIC_LITERAL.replace_all(&stripped, "?");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

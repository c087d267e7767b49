//! End-to-end ranking scenarios with mock embedding providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parlance::{
    Dialect, EmbeddingError, EmbeddingProvider, Intent, RankingConfig, Result, SchemaContext,
    SimilarityRanker,
};

/// Deterministic provider: embeds every text into the same vector, so
/// similarities are identical and only heuristics differentiate.
struct UniformProvider {
    calls: AtomicUsize,
}

impl UniformProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for UniformProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| vec![0.6, 0.8]).collect())
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Provider that always fails, forcing degraded mode.
struct UnavailableProvider;

#[async_trait]
impl EmbeddingProvider for UnavailableProvider {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(EmbeddingError::Unavailable.into())
    }

    fn dimension(&self) -> usize {
        0
    }
}

fn customers_schema() -> SchemaContext {
    SchemaContext::from_tables(["customers", "orders"])
}

#[tokio::test]
async fn schema_overlap_beats_embedding_noise() {
    // Uniform embeddings: similarity is identical for both candidates,
    // so the customers candidate must win on schema-term overlap alone.
    let ranker = SimilarityRanker::new(
        Arc::new(UniformProvider::new()),
        RankingConfig::default(),
    );

    let candidates = vec![
        "SELECT * FROM customers LIMIT 10;".to_string(),
        "SELECT * FROM orders;".to_string(),
    ];
    let result = ranker
        .rank(
            "show all customers",
            &candidates,
            &customers_schema(),
            Some(Intent::Select),
            Dialect::MySql,
        )
        .await;

    assert!(!result.degraded);
    assert_eq!(result.ranked[0].query, "SELECT * FROM customers LIMIT 10;");
    assert!(result.ranked[0].heuristic_score > result.ranked[1].heuristic_score);
}

#[tokio::test]
async fn all_texts_are_embedded_in_one_invocation() {
    let provider = Arc::new(UniformProvider::new());
    let ranker = SimilarityRanker::new(provider.clone(), RankingConfig::default());

    let candidates: Vec<String> = (0..8)
        .map(|i| format!("SELECT c{i} FROM customers LIMIT 1;"))
        .collect();
    let _ = ranker
        .rank(
            "show customers",
            &candidates,
            &customers_schema(),
            None,
            Dialect::MySql,
        )
        .await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn degraded_mode_is_flagged_not_silent() {
    let ranker = SimilarityRanker::new(Arc::new(UnavailableProvider), RankingConfig::default());

    let candidates = vec![
        "SELECT * FROM customers LIMIT 10;".to_string(),
        "SELECT * FROM orders;".to_string(),
    ];
    let result = ranker
        .rank(
            "show all customers",
            &candidates,
            &customers_schema(),
            Some(Intent::Select),
            Dialect::MySql,
        )
        .await;

    assert!(result.degraded);
    assert!(result.ranked.iter().all(|e| e.similarity == 0.0));
    // Heuristic still orders the customers candidate first.
    assert_eq!(result.ranked[0].query, "SELECT * FROM customers LIMIT 10;");
}

#[tokio::test]
async fn equal_scores_preserve_candidate_order() {
    let ranker = SimilarityRanker::new(
        Arc::new(UniformProvider::new()),
        RankingConfig::default(),
    );

    // Same table, same kind: identical similarity and heuristic scores.
    let candidates = vec![
        "SELECT id FROM customers LIMIT 5;".to_string(),
        "SELECT name FROM customers LIMIT 5;".to_string(),
        "SELECT email FROM customers LIMIT 5;".to_string(),
    ];
    let result = ranker
        .rank(
            "show customers",
            &candidates,
            &customers_schema(),
            Some(Intent::Select),
            Dialect::MySql,
        )
        .await;

    let order: Vec<_> = result.ranked.iter().map(|e| e.query.clone()).collect();
    assert_eq!(order, candidates);

    // Rankings are reproducible run to run.
    let again = ranker
        .rank(
            "show customers",
            &candidates,
            &customers_schema(),
            Some(Intent::Select),
            Dialect::MySql,
        )
        .await;
    let order_again: Vec<_> = again.ranked.iter().map(|e| e.query.clone()).collect();
    assert_eq!(order, order_again);
}

#[tokio::test]
async fn combined_score_respects_configured_weights() {
    let config = RankingConfig {
        similarity_weight: 0.5,
        heuristic_weight: 0.5,
        intent_bonus: 0.0,
    };
    let ranker = SimilarityRanker::new(Arc::new(UniformProvider::new()), config);

    let candidates = vec!["SELECT * FROM customers LIMIT 10;".to_string()];
    let result = ranker
        .rank(
            "show all customers",
            &candidates,
            &customers_schema(),
            None,
            Dialect::MySql,
        )
        .await;

    let entry = &result.ranked[0];
    let expected = 0.5 * entry.similarity + 0.5 * entry.heuristic_score;
    assert!((entry.combined_score - expected).abs() < 1e-6);
    // Identical vectors: similarity is exactly 1 before weighting.
    assert!((entry.similarity - 1.0).abs() < 1e-5);
}

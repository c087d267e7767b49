//! Fallback provider for deployments without an embedding model.

use async_trait::async_trait;

use crate::error::{EmbeddingError, Result};

use super::EmbeddingProvider;

/// Provider that always reports embeddings as unavailable.
///
/// Selected at startup when the embedding feature is disabled; the
/// ranker observes the failure and switches to heuristic-only scoring
/// with the degraded flag set. Callers never branch on whether a model
/// happened to initialize.
pub struct NoopEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for NoopEmbeddingProvider {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(EmbeddingError::Unavailable.into())
    }

    fn dimension(&self) -> usize {
        0
    }
}

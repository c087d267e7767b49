//! Embedding trait definitions.

use async_trait::async_trait;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for text.
    async fn embed(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>>;

    /// Return the embedding dimension.
    fn dimension(&self) -> usize;

    /// Return the maximum batch size.
    fn max_batch_size(&self) -> usize {
        100
    }
}

//! Embedding providers for semantic similarity scoring.
//!
//! The ranker depends only on the [`EmbeddingProvider`] trait. Three
//! implementations are selected from configuration at startup:
//!
//! - [`LocalEmbeddingProvider`]: fastembed-rs ONNX models, inference
//!   offloaded to the blocking thread pool.
//! - [`ApiEmbeddingProvider`]: OpenAI-compatible HTTP endpoint.
//! - [`NoopEmbeddingProvider`]: no model; every embed call fails with
//!   `EmbeddingError::Unavailable`, putting the ranker in degraded mode.
//!
//! [`BatchEmbeddingProcessor`] wraps a provider with chunking, rate
//! limiting, and retry with exponential backoff on HTTP 429.

mod api;
mod batch;
mod local;
mod noop;
mod traits;

pub use api::ApiEmbeddingProvider;
pub use batch::{BatchConfig, BatchEmbeddingProcessor};
pub use local::LocalEmbeddingProvider;
pub use noop::NoopEmbeddingProvider;
pub use traits::EmbeddingProvider;

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::Result;

/// Create an embedding provider from configuration, wrapped in the batch
/// processor so arbitrarily many candidates fit one request.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::Local => {
            let provider = LocalEmbeddingProvider::new(&config.model)?;
            Ok(Arc::new(BatchEmbeddingProcessor::with_defaults(provider)))
        }
        EmbeddingProviderKind::Api => {
            let provider = ApiEmbeddingProvider::from_config(&config.api)?;
            // Conservative default rate limit for API providers
            let batch_config = BatchConfig::default()
                .with_batch_size(config.api.batch_size)
                .with_rate_limit(10);
            Ok(Arc::new(BatchEmbeddingProcessor::new(
                provider,
                batch_config,
            )))
        }
        EmbeddingProviderKind::Disabled => {
            tracing::info!("embeddings disabled; ranking will run in degraded mode");
            Ok(Arc::new(NoopEmbeddingProvider))
        }
    }
}

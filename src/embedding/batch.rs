//! Batch processing with rate limiting for embedding providers.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::NotKeyed, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{EmbeddingError, ParlanceError, Result};

use super::EmbeddingProvider;

/// Check if an error is a rate limit error.
fn is_rate_limit_error(error: &ParlanceError) -> bool {
    matches!(error, ParlanceError::Embedding(EmbeddingError::RateLimited))
}

type DefaultRateLimiter =
    RateLimiter<NotKeyed, governor::state::InMemoryState, DefaultClock, NoOpMiddleware>;

/// Batch embedding processor with rate limiting and retry logic.
///
/// A request's texts go to the provider as one invocation when they fit;
/// oversized inputs are split into provider-sized chunks.
pub struct BatchEmbeddingProcessor<P: EmbeddingProvider> {
    provider: Arc<P>,
    rate_limiter: Option<Arc<DefaultRateLimiter>>,
    batch_size: usize,
    max_retries: usize,
    retry_delay: Duration,
}

/// Configuration for batch processing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of texts per batch
    pub batch_size: usize,
    /// Requests per second limit (0 = no limit)
    pub requests_per_second: u32,
    /// Maximum number of retries on failure
    pub max_retries: usize,
    /// Delay between retries
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            requests_per_second: 0, // No limit by default
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl BatchConfig {
    /// Create a new batch config with rate limiting.
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl<P: EmbeddingProvider + 'static> BatchEmbeddingProcessor<P> {
    /// Create a new batch processor with the given provider and configuration.
    pub fn new(provider: P, config: BatchConfig) -> Self {
        let rate_limiter = if config.requests_per_second > 0 {
            let quota = Quota::per_second(NonZeroU32::new(config.requests_per_second).unwrap());
            Some(Arc::new(RateLimiter::direct(quota)))
        } else {
            None
        };

        // Use the smaller of configured batch size and provider's max batch size
        let batch_size = config.batch_size.min(provider.max_batch_size());

        Self {
            provider: Arc::new(provider),
            rate_limiter,
            batch_size,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Create a new batch processor with default configuration.
    pub fn with_defaults(provider: P) -> Self {
        Self::new(provider, BatchConfig::default())
    }

    /// Process a large batch of texts, splitting into smaller batches and handling rate limiting.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let chunk_embeddings = self.embed_with_retry(chunk).await?;
            all_embeddings.extend(chunk_embeddings);
        }

        Ok(all_embeddings)
    }

    /// Embed a batch with retry logic.
    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            // Wait for rate limiter if configured
            if let Some(ref limiter) = self.rate_limiter {
                limiter.until_ready().await;
            }

            match self.provider.embed(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    let is_rate_limited = is_rate_limit_error(&e);

                    if attempt < self.max_retries {
                        let delay = if is_rate_limited {
                            // Exponential backoff for rate limiting
                            self.retry_delay * (2u32.pow(attempt as u32))
                        } else {
                            self.retry_delay
                        };

                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            delay_ms = delay.as_millis(),
                            "Embedding request failed, retrying: {}",
                            e
                        );

                        tokio::time::sleep(delay).await;
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap())
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the effective batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[async_trait]
impl<P: EmbeddingProvider + 'static> EmbeddingProvider for BatchEmbeddingProcessor<P> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_all(texts).await
    }

    fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    fn max_batch_size(&self) -> usize {
        // The batch processor can handle any size by chunking
        usize::MAX
    }
}

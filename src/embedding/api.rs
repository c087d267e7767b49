//! API-based embedding provider (OpenAI-compatible).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ApiEmbeddingConfig;
use crate::error::{EmbeddingError, Result};

use super::EmbeddingProvider;

/// OpenAI-compatible API embedding provider.
pub struct ApiEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dimension: usize,
    max_batch_size: usize,
}

/// OpenAI embedding request format.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding_format: Option<&'a str>,
}

/// OpenAI embedding response format.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ApiEmbeddingProvider {
    /// Create a new API embedding provider from configuration.
    pub fn from_config(config: &ApiEmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                EmbeddingError::Api(
                    "API key not provided and OPENAI_API_KEY env var not set".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Api(format!("Failed to create HTTP client: {}", e)))?;

        let dimension = Self::get_model_dimension(&config.model);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            dimension,
            max_batch_size: config.batch_size,
        })
    }

    fn get_model_dimension(model: &str) -> usize {
        match model {
            // OpenAI models
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            // Voyage AI models
            "voyage-large-2" => 1536,
            "voyage-2" => 1024,
            // Cohere models
            "embed-english-v3.0" => 1024,
            "embed-english-light-v3.0" => 384,
            // Default for unknown models
            _ => 1536,
        }
    }

    /// Make an embedding request to the API.
    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: Some("float"),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Api("Request timed out".to_string())
                } else if e.is_connect() {
                    EmbeddingError::Api(format!("Connection failed: {}", e))
                } else {
                    EmbeddingError::Api(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| EmbeddingError::Api(format!("Failed to parse response: {}", e)))?;

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = result.data.into_iter().collect();
            embeddings.sort_by_key(|d| d.index);

            Ok(embeddings.into_iter().map(|d| d.embedding).collect())
        } else if status.as_u16() == 429 {
            Err(EmbeddingError::RateLimited.into())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            // Try to parse as OpenAI error format
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(EmbeddingError::Api(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                ))
                .into())
            } else {
                Err(EmbeddingError::Api(format!("API error ({}): {}", status, error_text)).into())
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ApiEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        if texts.len() > self.max_batch_size {
            return Err(EmbeddingError::BatchTooLarge(texts.len(), self.max_batch_size).into());
        }

        self.request_embeddings(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

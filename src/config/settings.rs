//! Configuration settings for the parlance core.
//!
//! Policy is fixed for the lifetime of the process: the configuration is
//! loaded and validated once at startup and never mutated afterwards.
//! Restart the service to change strictness, ranking weights, or the
//! embedding provider.

use crate::error::{ConfigError, Result};
use crate::safety::Strictness;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub safety: SafetyConfig,
    pub ranking: RankingConfig,
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("parlance.toml"),
            dirs::config_dir()
                .map(|p| p.join("parlance/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    ///
    /// Errors here are fatal at startup: a process with malformed ranking
    /// weights or an incomplete embedding configuration must not serve
    /// requests.
    pub fn validate(&self) -> Result<()> {
        let ranking = &self.ranking;
        if ranking.similarity_weight < 0.0 || ranking.heuristic_weight < 0.0 {
            return Err(
                ConfigError::Invalid("ranking weights must be non-negative".to_string()).into(),
            );
        }
        let sum = ranking.similarity_weight + ranking.heuristic_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "ranking weights must sum to 1.0, got {sum}"
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&ranking.intent_bonus) {
            return Err(
                ConfigError::Invalid("ranking.intent_bonus must be in [0, 1]".to_string()).into(),
            );
        }

        if self.embedding.provider == EmbeddingProviderKind::Api {
            if self.embedding.api.base_url.is_empty() {
                return Err(ConfigError::MissingField("embedding.api.base_url".to_string()).into());
            }
            if self.embedding.api.model.is_empty() {
                return Err(ConfigError::MissingField("embedding.api.model".to_string()).into());
            }
        }

        Ok(())
    }
}

/// Safety policy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Blocking mode for detector matches: "strict" or "permissive".
    pub strictness: Strictness,
}

/// Candidate ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of the embedding cosine similarity in the combined score.
    pub similarity_weight: f32,
    /// Weight of the schema-overlap heuristic in the combined score.
    pub heuristic_weight: f32,
    /// Bonus added to the heuristic score when a candidate's statement
    /// kind matches the inferred intent.
    pub intent_bonus: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.7,
            heuristic_weight: 0.3,
            intent_bonus: 0.2,
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type: "local", "api", or "disabled"
    pub provider: EmbeddingProviderKind,
    /// Model name for local embeddings
    pub model: String,
    /// API configuration
    pub api: ApiEmbeddingConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Local,
            model: "BAAI/bge-small-en-v1.5".to_string(),
            api: ApiEmbeddingConfig::default(),
        }
    }
}

/// Embedding provider kind enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Local,
    Api,
    /// No embedding model; the ranker always runs in degraded mode.
    Disabled,
}

/// API embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEmbeddingConfig {
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from environment if not set)
    pub api_key: Option<String>,
    /// Batch size for embedding requests
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            batch_size: 100,
            timeout_secs: 30,
        }
    }
}

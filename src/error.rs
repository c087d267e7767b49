//! Error types for the parlance query-safety and ranking core.

use thiserror::Error;

/// Main error type for parlance operations.
#[derive(Error, Debug)]
pub enum ParlanceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors. These are fatal at startup: a process
/// with an invalid signature catalog or ranking weights must not serve
/// requests.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Embedding-related errors. Never fatal for a request: the ranker
/// degrades to heuristic-only scoring when embedding fails.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Embeddings unavailable")]
    Unavailable,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Batch too large: {0} (max {1})")]
    BatchTooLarge(usize, usize),
}

/// Result type alias for parlance operations.
pub type Result<T> = std::result::Result<T, ParlanceError>;

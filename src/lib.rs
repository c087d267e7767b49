//! Parlance: query safety filtering and semantic candidate ranking
//!
//! A pure computation library for natural-language-to-query services:
//! generated SQL/MongoDB candidates are filtered through a safety policy
//! (statement-tree inspection plus injection-signature scanning) and the
//! survivors are ranked by embedding similarity blended with rule-based
//! schema heuristics.
//!
//! All components are stateless over their inputs plus a signature
//! catalog and ranking weights loaded once at startup; there is no
//! per-request shared mutable state and no locking. The HTTP layer,
//! schema introspection, and candidate generation are external
//! collaborators.

pub mod config;
pub mod embedding;
pub mod error;
pub mod intent;
pub mod rank;
pub mod safety;
pub mod schema;

pub use config::{
    ApiEmbeddingConfig, Config, EmbeddingConfig, EmbeddingProviderKind, RankingConfig,
    SafetyConfig,
};
pub use embedding::{
    create_provider, ApiEmbeddingProvider, BatchConfig, BatchEmbeddingProcessor,
    EmbeddingProvider, LocalEmbeddingProvider, NoopEmbeddingProvider,
};
pub use error::{ConfigError, EmbeddingError, ParlanceError, Result};
pub use intent::{classify_intent, classify_operation, Intent};
pub use rank::{RankEntry, RankedQueries, SimilarityRanker};
pub use safety::document::DocumentOperation;
pub use safety::signatures::{Detection, SignatureCatalog, ThreatSignature};
pub use safety::syntax::{StatementKind, SyntaxReport};
pub use safety::{Dialect, SafetyPolicy, SafetyVerdict, Severity, Strictness};
pub use schema::SchemaContext;

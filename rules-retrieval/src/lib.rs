//! Scope-locked retrieval over a [`rules_index::RuleIndex`].
//!
//! The retriever binds one index to one `(season, competition)` scope at
//! construction and refuses to answer across scopes. On top of raw
//! nearest-neighbor search it applies a distance threshold, a defensive
//! per-hit scope re-check, and exact citation verification against the
//! stored chunk texts.

pub mod config;
pub mod embed;
pub mod embed_pool;
pub mod errors;
pub mod retriever;

pub use config::RetrievalConfig;
pub use embed::{EmbeddingsProvider, LlmEmbedder};
pub use embed_pool::embed_missing;
pub use errors::RetrievalError;
pub use retriever::{CitationStatus, RuleRetriever};

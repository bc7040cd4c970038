//! Error types for the retrieval layer.

use rules_index::IndexError;
use thiserror::Error;

/// Errors raised by [`crate::RuleRetriever`] and the embedding pool.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The index's bound scope disagrees with the requested scope.
    ///
    /// Raised at construction, never silently corrected.
    #[error("scope mismatch on {field}: index has {got:?}, retriever wants {want}")]
    ScopeMismatch {
        /// Which part disagreed (`season`, `competition`, or `scope` when unbound).
        field: &'static str,
        /// The index's bound value, if any.
        got: Option<String>,
        /// The requested value.
        want: String,
    },

    /// Underlying index failure (dimension, scope, or corruption).
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The embedding provider failed.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// Retrieval configuration is unusable.
    #[error("invalid retrieval config: {0}")]
    Config(&'static str),
}

impl From<llm_service::LlmError> for RetrievalError {
    fn from(e: llm_service::LlmError) -> Self {
        Self::Embedding(e.to_string())
    }
}

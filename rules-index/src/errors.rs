//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for index operations.
///
/// Structural violations (dimension, scope, corruption) are fatal and are
/// never downgraded to warnings by this crate.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A JSONL row failed strict deserialization.
    #[error("jsonl parse error on line {line}: {source}")]
    Jsonl {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Vector length (or chunk/vector batch length) disagreement.
    #[error("dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// A chunk's season/competition differs from the index's bound scope.
    /// Never auto-corrected; mixing scopes in one index is forbidden.
    #[error("scope violation: chunk {chunk_id} belongs to {got}, index is bound to {want}")]
    ScopeViolation {
        chunk_id: String,
        got: String,
        want: String,
    },

    /// Persisted artifacts are missing or internally inconsistent.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}

//! Error types for the mode controllers.

use rules_retrieval::RetrievalError;
use thiserror::Error;

/// Errors raised while running an answering mode.
///
/// Generation transport failures are deliberately absent: they are embedded
/// in the answer text and surfaced through the verdict instead of aborting
/// the pipeline.
#[derive(Debug, Error)]
pub enum ModeError {
    /// Retrieval failed before any generation was attempted.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Reasoning-log or report I/O failed.
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

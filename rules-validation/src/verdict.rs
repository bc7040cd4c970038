//! Validation verdict attached to every generated answer.

use serde::{Deserialize, Serialize};

/// Outcome of validating one answer, created fresh per call.
///
/// The verdict annotates; downstream code decides what to do with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The answer carries the required structural sections for its mode.
    pub format_valid: bool,
    /// The answer names at least one rule reference.
    pub has_citations: bool,
    /// The answer contains at least one double-quoted span.
    pub has_quotes: bool,
    /// Every checked quote was found verbatim in the supplied evidence.
    pub quotes_verified: bool,
    /// Human-readable findings, empty when everything checked out.
    pub warnings: Vec<String>,
}

impl Verdict {
    /// True when nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.format_valid && self.warnings.is_empty()
    }
}

//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The (season, competition) pair that partitions all rulebook data.
///
/// No chunk, index, or query may cross a scope boundary. Equality is exact
/// string equality on both fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub season: String,
    pub competition: String,
}

impl Scope {
    pub fn new(season: impl Into<String>, competition: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            competition: competition.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.season, self.competition)
    }
}

/// A word-bounded span of rulebook text with attached provenance metadata.
///
/// The schema is fixed: required fields are required by the type, optional
/// fields are `Option`/defaulted. There is no ad hoc key lookup anywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleChunk {
    pub chunk_id: String,
    pub document_name: String,
    pub season: String,
    pub competition: String,
    pub chunk_text: String,
    pub page_number: u32,
    #[serde(default)]
    pub section_title: Option<String>,
    /// Structured rule identifier, e.g. `T.2.3.1`.
    #[serde(default)]
    pub clause_id: Option<String>,
    #[serde(default)]
    pub is_table: bool,
    #[serde(default)]
    pub word_count: usize,
}

impl RuleChunk {
    /// The scope this chunk belongs to.
    pub fn scope(&self) -> Scope {
        Scope::new(&self.season, &self.competition)
    }

    /// Exact scope equality check.
    pub fn in_scope(&self, scope: &Scope) -> bool {
        self.season == scope.season && self.competition == scope.competition
    }
}

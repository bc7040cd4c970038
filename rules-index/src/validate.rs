//! Content-quality validation for ingested chunks.
//!
//! Findings here are quality signals, not structural failures: a finding
//! never aborts anything. Strict mode only controls which chunks survive
//! batch filtering before indexing.

use serde::Serialize;
use tracing::warn;

use crate::chunk::RuleChunk;

/// Severity of a single finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Category of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    EmptyText,
    TooShort,
    TooLong,
    CorruptedText,
}

/// One content-quality finding for one chunk.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkFinding {
    pub chunk_id: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

/// Configurable validator applied between ingestion and indexing.
pub struct ChunkValidator {
    min_words: usize,
    max_words: usize,
    strict: bool,
}

impl ChunkValidator {
    /// `strict` rejects chunks with warnings as well as errors.
    pub fn new(min_words: usize, max_words: usize, strict: bool) -> Self {
        Self {
            min_words,
            max_words,
            strict,
        }
    }

    /// Checks one chunk and returns all findings (empty if clean).
    pub fn validate_chunk(&self, chunk: &RuleChunk) -> Vec<ChunkFinding> {
        let mut findings = Vec::new();
        let text = chunk.chunk_text.trim();

        if text.is_empty() {
            findings.push(finding(
                chunk,
                FindingKind::EmptyText,
                Severity::Error,
                "chunk text is empty".to_string(),
            ));
            return findings;
        }

        if looks_corrupted(text) {
            findings.push(finding(
                chunk,
                FindingKind::CorruptedText,
                Severity::Error,
                "chunk text appears corrupted (excessive special characters)".to_string(),
            ));
        }

        let words = text.split_whitespace().count();
        // Tables are allowed to be short.
        if !chunk.is_table && words < self.min_words {
            findings.push(finding(
                chunk,
                FindingKind::TooShort,
                Severity::Warning,
                format!("chunk has {words} words, minimum is {}", self.min_words),
            ));
        }
        if words > self.max_words {
            findings.push(finding(
                chunk,
                FindingKind::TooLong,
                Severity::Error,
                format!("chunk has {words} words, maximum is {}", self.max_words),
            ));
        }

        findings
    }

    /// Filters a batch into surviving chunks plus the collected findings.
    pub fn validate_chunks(&self, chunks: Vec<RuleChunk>) -> (Vec<RuleChunk>, Vec<ChunkFinding>) {
        let mut kept = Vec::with_capacity(chunks.len());
        let mut all = Vec::new();

        for chunk in chunks {
            let findings = self.validate_chunk(&chunk);
            let has_error = findings.iter().any(|f| f.severity == Severity::Error);
            let reject = has_error || (self.strict && !findings.is_empty());
            if reject {
                warn!(
                    "rejecting chunk {} ({} findings)",
                    chunk.chunk_id,
                    findings.len()
                );
            } else {
                kept.push(chunk);
            }
            all.extend(findings);
        }

        (kept, all)
    }
}

fn finding(
    chunk: &RuleChunk,
    kind: FindingKind,
    severity: Severity,
    message: String,
) -> ChunkFinding {
    ChunkFinding {
        chunk_id: chunk.chunk_id.clone(),
        kind,
        severity,
        message,
    }
}

/// Heuristic for text mangled by PDF extraction: too many special characters
/// or too few readable words.
fn looks_corrupted(text: &str) -> bool {
    if text.len() < 10 {
        return true;
    }

    let total = text.chars().count();
    let plain = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .count();
    if (total - plain) as f32 / total as f32 > 0.3 {
        return true;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let readable = words
        .iter()
        .filter(|w| w.chars().count() > 2 && w.chars().next().is_some_and(|c| c.is_alphabetic()))
        .count();
    words.len() > 5 && (readable as f32 / words.len() as f32) < 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk_with_text(text: &str, is_table: bool) -> RuleChunk {
        RuleChunk {
            chunk_id: "2024_FSAE_00001".to_string(),
            document_name: "FSAE_Rules_2024.pdf".to_string(),
            season: "2024".to_string(),
            competition: "FSAE".to_string(),
            chunk_text: text.to_string(),
            page_number: 1,
            section_title: None,
            clause_id: None,
            is_table,
            word_count: text.split_whitespace().count(),
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn clean_chunk_has_no_findings() {
        let v = ChunkValidator::new(150, 400, true);
        assert!(v.validate_chunk(&chunk_with_text(&words(200), false)).is_empty());
    }

    #[test]
    fn short_chunk_is_a_warning() {
        let v = ChunkValidator::new(150, 400, true);
        let findings = v.validate_chunk(&chunk_with_text(&words(20), false));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::TooShort);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn long_chunk_is_an_error() {
        let v = ChunkValidator::new(150, 400, true);
        let findings = v.validate_chunk(&chunk_with_text(&words(500), false));
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::TooLong && f.severity == Severity::Error));
    }

    #[test]
    fn tables_may_be_short() {
        let v = ChunkValidator::new(150, 400, true);
        let findings = v.validate_chunk(&chunk_with_text("Header | Value and Row | Data here", true));
        assert!(!findings.iter().any(|f| f.kind == FindingKind::TooShort));
    }

    #[test]
    fn garbage_text_is_detected() {
        let v = ChunkValidator::new(1, 400, true);
        let findings = v.validate_chunk(&chunk_with_text("@#$%^&*()_+{}|:<>?~`@#$%", false));
        assert!(findings.iter().any(|f| f.kind == FindingKind::CorruptedText));
    }

    #[test]
    fn strict_mode_drops_warned_chunks() {
        let v = ChunkValidator::new(150, 400, true);
        let (kept, findings) = v.validate_chunks(vec![
            chunk_with_text(&words(200), false),
            chunk_with_text(&words(20), false),
        ]);
        assert_eq!(kept.len(), 1);
        assert!(!findings.is_empty());
    }

    #[test]
    fn lenient_mode_keeps_warned_chunks() {
        let v = ChunkValidator::new(150, 400, false);
        let (kept, _) = v.validate_chunks(vec![
            chunk_with_text(&words(200), false),
            chunk_with_text(&words(20), false),
        ]);
        assert_eq!(kept.len(), 2);
    }
}

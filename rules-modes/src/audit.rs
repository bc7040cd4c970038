//! Audit mode: full retrieval and reasoning trace.

use std::fmt::Write as _;

use rules_index::RuleChunk;
use rules_validation::{AnswerMode, Verdict};
use serde::Serialize;

use crate::errors::ModeError;
use crate::generator::AnswerGenerator;

/// One ranked chunk in an audit report, all metadata exposed.
#[derive(Debug, Clone, Serialize)]
pub struct AuditChunk {
    /// 1-based retrieval rank.
    pub rank: usize,
    pub chunk_id: String,
    pub document: String,
    pub season: String,
    pub competition: String,
    pub section: Option<String>,
    pub clause_id: Option<String>,
    pub page: u32,
    pub is_table: bool,
    pub word_count: usize,
    pub text: String,
}

impl AuditChunk {
    fn from_chunk(rank: usize, c: &RuleChunk) -> Self {
        Self {
            rank,
            chunk_id: c.chunk_id.clone(),
            document: c.document_name.clone(),
            season: c.season.clone(),
            competition: c.competition.clone(),
            section: c.section_title.clone(),
            clause_id: c.clause_id.clone(),
            page: c.page_number,
            is_table: c.is_table,
            word_count: c.word_count,
            text: c.chunk_text.clone(),
        }
    }
}

/// Serializable audit report: everything needed to verify an answer.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub question: String,
    pub season: String,
    pub competition: String,
    pub chunks_retrieved: usize,
    pub retrieved_chunks: Vec<AuditChunk>,
    pub answer: String,
    pub citations: Vec<String>,
    pub verdict: Verdict,
    /// The exact prompt that produced the answer.
    pub prompt_used: String,
}

impl AuditReport {
    /// Renders the report for a terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);

        let _ = writeln!(out, "\n{rule}\nAUDIT REPORT\n{rule}");
        let _ = writeln!(out, "\nQuestion: {}", self.question);
        let _ = writeln!(out, "Season: {}", self.season);
        let _ = writeln!(out, "Competition: {}", self.competition);
        let _ = writeln!(out, "\nChunks Retrieved: {}", self.chunks_retrieved);

        let _ = writeln!(out, "\n{thin}\nRETRIEVED CHUNKS:\n{thin}");
        for c in &self.retrieved_chunks {
            let _ = writeln!(
                out,
                "\n[{}] {} - {}",
                c.rank,
                c.clause_id.as_deref().unwrap_or("N/A"),
                c.section.as_deref().unwrap_or("N/A"),
            );
            let _ = writeln!(out, "    Document: {}", c.document);
            let _ = writeln!(out, "    Page: {}", c.page);
            let _ = writeln!(out, "    Words: {}", c.word_count);
            let _ = writeln!(out, "    Table: {}", c.is_table);
            let _ = writeln!(out, "    Text: {}", preview(&c.text, 300));
        }

        let _ = writeln!(out, "\n{thin}\nANSWER:\n{thin}\n{}", self.answer);

        let _ = writeln!(out, "\n{thin}\nVALIDATION:\n{thin}");
        let _ = writeln!(out, "  format_valid:    {}", self.verdict.format_valid);
        let _ = writeln!(out, "  has_citations:   {}", self.verdict.has_citations);
        let _ = writeln!(out, "  has_quotes:      {}", self.verdict.has_quotes);
        let _ = writeln!(out, "  quotes_verified: {}", self.verdict.quotes_verified);
        for w in &self.verdict.warnings {
            let _ = writeln!(out, "  warning: {w}");
        }

        if !self.citations.is_empty() {
            let _ = writeln!(out, "\n{thin}\nEXTRACTED CITATIONS:\n{thin}");
            for c in &self.citations {
                let _ = writeln!(out, "  - {c}");
            }
        }

        let _ = writeln!(out, "\n{rule}");
        out
    }
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// Audit mode handler for debugging and verification.
pub struct AuditMode {
    generator: AnswerGenerator,
}

impl AuditMode {
    /// Creates an audit handler.
    pub fn new(generator: AnswerGenerator) -> Self {
        Self { generator }
    }

    /// Runs the pipeline under the audit prompt and assembles the report.
    ///
    /// # Errors
    /// [`ModeError::Retrieval`] if retrieval fails.
    pub async fn audit(&self, question: &str) -> Result<AuditReport, ModeError> {
        let generated = self.generator.generate(question, AnswerMode::Audit).await?;
        let scope = self.generator.retriever().scope();

        Ok(AuditReport {
            question: question.to_string(),
            season: scope.season.clone(),
            competition: scope.competition.clone(),
            chunks_retrieved: generated.chunks.len(),
            retrieved_chunks: generated
                .chunks
                .iter()
                .enumerate()
                .map(|(i, c)| AuditChunk::from_chunk(i + 1, c))
                .collect(),
            answer: generated.answer,
            citations: generated.citations,
            verdict: generated.verdict,
            prompt_used: generated.prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::generator_with;

    #[tokio::test]
    async fn report_carries_scope_and_ranked_chunks() {
        let answer = "Final Answer:\nYes.\n\nRule References:\nT.6.3.1\n\n\
                      Supporting Quotes:\n\"must be equipped with a red brake light\"";
        let audit = AuditMode::new(generator_with(answer, false));
        let report = audit.audit("Is a brake light required?").await.unwrap();

        assert_eq!(report.season, "2024");
        assert_eq!(report.competition, "FSG");
        assert_eq!(report.retrieved_chunks.len(), 1);
        assert_eq!(report.retrieved_chunks[0].rank, 1);
        assert_eq!(report.citations, vec!["T.6.3.1"]);
        assert!(report.prompt_used.contains("audit mode"));
    }

    #[tokio::test]
    async fn report_serializes_and_renders() {
        let answer = "Final Answer:\nYes.\n\nRule References:\nT.6.3.1";
        let audit = AuditMode::new(generator_with(answer, false));
        let report = audit.audit("Is a brake light required?").await.unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["chunks_retrieved"], 1);
        assert!(json["verdict"]["format_valid"].as_bool().unwrap());

        let rendered = report.render();
        assert!(rendered.contains("AUDIT REPORT"));
        assert!(rendered.contains("[1] T.6.3.1 - Lighting"));
        assert!(rendered.contains("EXTRACTED CITATIONS"));
    }
}

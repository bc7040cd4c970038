//! Option elimination mode.
//!
//! Sends the lettered options alongside the question, parses the model's
//! per-option analysis, and derives a recommendation from the statuses.

use rules_validation::{AnswerMode, Verdict};
use serde::Serialize;
use tracing::debug;

use crate::errors::ModeError;
use crate::generator::AnswerGenerator;
use crate::options::{OptionAnalysis, parse_analysis, recommendation};

/// Full elimination analysis for one question.
#[derive(Debug, Clone, Serialize)]
pub struct EliminationReport {
    /// Question text, without options.
    pub question: String,
    /// The options as supplied.
    pub options: Vec<String>,
    /// Parsed per-option verdicts.
    pub analysis: Vec<OptionAnalysis>,
    /// Derived recommendation.
    pub recommendation: String,
    /// Raw model response, for audit.
    pub raw_response: String,
    /// Number of evidence chunks retrieved.
    pub chunks_retrieved: usize,
    /// Validation verdict on the raw response.
    pub verdict: Verdict,
}

/// Elimination mode handler for multiple-choice questions.
pub struct EliminationMode {
    generator: AnswerGenerator,
}

impl EliminationMode {
    /// Creates an elimination handler.
    pub fn new(generator: AnswerGenerator) -> Self {
        Self { generator }
    }

    /// Analyzes each option against the rules.
    ///
    /// # Errors
    /// [`ModeError::Retrieval`] if retrieval fails.
    pub async fn analyze(
        &self,
        question: &str,
        options: &[String],
    ) -> Result<EliminationReport, ModeError> {
        let mut full_question = format!("{question}\n\nOptions:\n");
        for (i, opt) in options.iter().enumerate() {
            full_question.push_str(&format!("{}) {opt}\n", (b'A' + i as u8) as char));
        }

        let generated = self
            .generator
            .generate(&full_question, AnswerMode::Elimination)
            .await?;

        let analysis = parse_analysis(&generated.answer, options);
        let recommendation = recommendation(&analysis);
        debug!(
            options = options.len(),
            chunks = generated.chunks.len(),
            %recommendation,
            "elimination analysis done"
        );

        Ok(EliminationReport {
            question: question.to_string(),
            options: options.to_vec(),
            analysis,
            recommendation,
            raw_response: generated.answer,
            chunks_retrieved: generated.chunks.len(),
            verdict: generated.verdict,
        })
    }
}

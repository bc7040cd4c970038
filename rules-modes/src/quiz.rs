//! Registration quiz mode.
//!
//! Outputs only the final choice (A/B/C/D or Yes/No). Full reasoning and
//! retrieved evidence go to an optional JSONL log for later audit.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rules_validation::{AnswerMode, Verdict};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ModeError;
use crate::generator::{AnswerGenerator, GeneratedAnswer};

/// One JSONL line in the quiz reasoning log.
#[derive(Debug, Serialize)]
struct QuizLogEntry<'a> {
    timestamp: DateTime<Utc>,
    question: &'a str,
    answer: &'a str,
    snapped_answer: &'a str,
    chunks_retrieved: usize,
    verdict: &'a Verdict,
    chunks: Vec<LoggedChunk<'a>>,
}

/// Truncated chunk view, enough to audit a quiz answer.
#[derive(Debug, Serialize)]
struct LoggedChunk<'a> {
    clause_id: Option<&'a str>,
    section: Option<&'a str>,
    text: String,
}

/// Quiz mode handler for registration questions.
pub struct QuizMode {
    generator: AnswerGenerator,
    log_file: Option<PathBuf>,
}

impl QuizMode {
    /// Creates a quiz handler; `log_file` enables the reasoning log.
    pub fn new(generator: AnswerGenerator, log_file: Option<PathBuf>) -> Self {
        Self {
            generator,
            log_file,
        }
    }

    /// Answers a quiz question, returning the single-token choice.
    ///
    /// When `choices` is given (comma-separated, e.g. `A,B,C,D` or
    /// `Yes,No`), an answer outside the set is snapped to the first choice
    /// appearing as a whole word in it; an unsalvageable answer passes
    /// through with a warning.
    ///
    /// # Errors
    /// [`ModeError::Retrieval`] or log I/O failures.
    pub async fn answer(
        &self,
        question: &str,
        choices: Option<&str>,
    ) -> Result<String, ModeError> {
        let generated = self.generator.generate(question, AnswerMode::Quiz).await?;

        let mut answer = generated.answer.trim().to_uppercase();

        if let Some(choices) = choices {
            let valid: Vec<String> = choices
                .split(',')
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect();
            if !valid.iter().any(|c| c == &answer) {
                // Whole-word match only: the "A" in "ANSWER" is not choice A.
                let snapped = valid.iter().find(|c| {
                    answer
                        .split(|ch: char| !ch.is_ascii_alphanumeric())
                        .any(|token| token == c.as_str())
                });
                if let Some(snapped) = snapped {
                    info!(raw = %answer, snapped = %snapped, "snapped quiz answer to a valid choice");
                    answer = snapped.clone();
                } else {
                    warn!(raw = %answer, ?valid, "quiz answer matches no valid choice");
                }
            }
        }

        if let Some(path) = &self.log_file {
            self.log_reasoning(path, question, &generated, &answer)?;
        }

        Ok(answer)
    }

    fn log_reasoning(
        &self,
        path: &PathBuf,
        question: &str,
        generated: &GeneratedAnswer,
        snapped: &str,
    ) -> Result<(), ModeError> {
        let entry = QuizLogEntry {
            timestamp: Utc::now(),
            question,
            answer: &generated.answer,
            snapped_answer: snapped,
            chunks_retrieved: generated.chunks.len(),
            verdict: &generated.verdict,
            chunks: generated
                .chunks
                .iter()
                .map(|c| LoggedChunk {
                    clause_id: c.clause_id.as_deref(),
                    section: c.section_title.as_deref(),
                    text: truncate(&c.chunk_text, 200),
                })
                .collect(),
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(&entry)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}

//! Structural and quote validation of generated answers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::mode::AnswerMode;
use crate::verdict::Verdict;

/// Every double-quoted span in an answer is a claimed verbatim quote.
static QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());

/// Quiz answers are a single token from this closed set.
const QUIZ_ANSWERS: [&str; 6] = ["A", "B", "C", "D", "YES", "NO"];

/// Marker the generator emits when the rules are silent on a question.
pub const NOT_SPECIFIED: &str = "Not explicitly specified";

/// Quotes shorter than this many words are exempt from evidence checking;
/// two-word fragments match almost anything and verify nothing.
const MIN_QUOTE_WORDS: usize = 3;

/// Validates generated answers against their mode contract and the
/// evidence chunks the answer was generated from.
///
/// Stateless apart from compiled regexes; annotates, never mutates.
#[derive(Debug, Default)]
pub struct AnswerValidator;

impl AnswerValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validates `answer` under `mode` against `evidence` chunk texts.
    ///
    /// Quiz answers get only the single-token format check. All other modes
    /// get section checks plus quote verification: every quoted span of at
    /// least three words must appear, case-insensitively, in some evidence
    /// chunk.
    pub fn validate(&self, answer: &str, mode: AnswerMode, evidence: &[&str]) -> Verdict {
        match mode {
            AnswerMode::Quiz => self.validate_quiz(answer),
            AnswerMode::OpenQa | AnswerMode::Elimination | AnswerMode::Audit => {
                self.validate_cited(answer, evidence)
            }
        }
    }

    fn validate_quiz(&self, answer: &str) -> Verdict {
        let token = answer.trim().to_uppercase();
        let format_valid = token.len() <= 3 && QUIZ_ANSWERS.contains(&token.as_str());

        let mut verdict = Verdict {
            format_valid,
            ..Verdict::default()
        };
        if !format_valid {
            verdict.warnings.push(format!(
                "quiz answer is not a single choice token: '{}'",
                truncate_chars(answer.trim(), 50)
            ));
        }
        verdict
    }

    fn validate_cited(&self, answer: &str, evidence: &[&str]) -> Verdict {
        let mut verdict = Verdict::default();

        verdict.format_valid = answer.contains("Final Answer:");
        if !verdict.format_valid {
            verdict
                .warnings
                .push("answer is missing the 'Final Answer:' section".to_string());
        }

        verdict.has_citations = answer.contains("Rule References:") || answer.contains("Clause");
        if !verdict.has_citations {
            verdict
                .warnings
                .push("answer cites no rule references".to_string());
        }

        let lowered: Vec<String> = evidence.iter().map(|e| e.to_lowercase()).collect();
        let mut all_verified = true;
        let mut quote_count = 0usize;

        for cap in QUOTE_RE.captures_iter(answer) {
            let quote = &cap[1];
            quote_count += 1;

            if quote.split_whitespace().count() < MIN_QUOTE_WORDS {
                continue;
            }

            let needle = quote.trim().to_lowercase();
            if !lowered.iter().any(|e| e.contains(&needle)) {
                all_verified = false;
                warn!(quote = %truncate_chars(quote, 50), "quote not found in evidence");
                verdict.warnings.push(format!(
                    "quote not found in provided rules: '{}'",
                    truncate_chars(quote, 50)
                ));
            }
        }

        verdict.has_quotes = quote_count > 0;
        verdict.quotes_verified = verdict.has_quotes && all_verified;

        if !verdict.has_quotes && !answer.contains(NOT_SPECIFIED) {
            verdict
                .warnings
                .push("answer contains no supporting quotes".to_string());
        }

        debug!(
            format_valid = verdict.format_valid,
            has_citations = verdict.has_citations,
            quotes = quote_count,
            quotes_verified = verdict.quotes_verified,
            warnings = verdict.warnings.len(),
            "answer validated"
        );
        verdict
    }
}

/// Char-safe prefix truncation for warning messages.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

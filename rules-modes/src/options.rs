//! Multiple-choice option extraction and analysis parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Option markers look like `A)` at a word boundary.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-F])\)").unwrap());

/// The model's per-option classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionStatus {
    /// Directly supported by the rules.
    Correct,
    /// Contradicted by the rules.
    Incorrect,
    /// Not addressed in the provided rules.
    Uncertain,
}

impl std::fmt::Display for OptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Correct => "CORRECT",
            Self::Incorrect => "INCORRECT",
            Self::Uncertain => "UNCERTAIN",
        };
        f.write_str(s)
    }
}

/// Parsed analysis for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionAnalysis {
    /// Option letter, `A` onward.
    pub option: char,
    /// Original option text.
    pub text: String,
    /// Status parsed from the model's analysis.
    pub status: OptionStatus,
    /// The raw analysis section for this option.
    pub reasoning: String,
}

/// Extracts lettered options (`A) …`) from a question, in marker order.
///
/// Returns an empty list for questions without inline options.
pub fn extract_options(question: &str) -> Vec<String> {
    let markers: Vec<_> = MARKER_RE.find_iter(question).collect();
    let mut out = Vec::with_capacity(markers.len());
    for (i, m) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(question.len());
        let text = question[m.end()..end].trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    out
}

/// Parses the model's per-option analysis out of a free-form response.
///
/// Sections are located by their `A)` markers; an option without a section
/// is marked [`OptionStatus::Uncertain`]. `INCORRECT` is checked before
/// `CORRECT` since the former contains the latter.
pub fn parse_analysis(response: &str, options: &[String]) -> Vec<OptionAnalysis> {
    let mut analyses = Vec::with_capacity(options.len());

    for (i, option_text) in options.iter().enumerate() {
        let letter = (b'A' + i as u8) as char;
        let marker = format!("{letter})");

        let Some(start) = response.find(&marker) else {
            analyses.push(OptionAnalysis {
                option: letter,
                text: option_text.clone(),
                status: OptionStatus::Uncertain,
                reasoning: "No analysis found".to_string(),
            });
            continue;
        };

        let tail = &response[start + marker.len()..];
        let end = ((i + 1)..options.len())
            .filter_map(|j| {
                let next = format!("{})", (b'A' + j as u8) as char);
                tail.find(&next)
            })
            .min()
            .map(|off| start + marker.len() + off)
            .unwrap_or(response.len());

        let section = response[start..end].trim();
        let upper = section.to_uppercase();
        let status = if upper.contains("INCORRECT") {
            OptionStatus::Incorrect
        } else if upper.contains("CORRECT") {
            OptionStatus::Correct
        } else {
            OptionStatus::Uncertain
        };

        analyses.push(OptionAnalysis {
            option: letter,
            text: option_text.clone(),
            status,
            reasoning: section.to_string(),
        });
    }

    analyses
}

/// Derives a recommendation from the per-option statuses.
///
/// Exactly one CORRECT option is a clear pick; several mean the analysis is
/// ambiguous; partial elimination lists what remains; everything else falls
/// back to the conservative default.
pub fn recommendation(analyses: &[OptionAnalysis]) -> String {
    let correct: Vec<char> = analyses
        .iter()
        .filter(|a| a.status == OptionStatus::Correct)
        .map(|a| a.option)
        .collect();
    let incorrect: Vec<char> = analyses
        .iter()
        .filter(|a| a.status == OptionStatus::Incorrect)
        .map(|a| a.option)
        .collect();
    let uncertain: Vec<char> = analyses
        .iter()
        .filter(|a| a.status == OptionStatus::Uncertain)
        .map(|a| a.option)
        .collect();

    if correct.len() == 1 {
        format!("Choose {}: Clearly supported by rules", correct[0])
    } else if correct.len() > 1 {
        format!(
            "Multiple options appear correct: {}. Review carefully.",
            join(&correct)
        )
    } else if !uncertain.is_empty() && incorrect.len() < analyses.len() {
        format!(
            "Eliminated: {}. Consider: {}",
            join(&incorrect),
            join(&uncertain)
        )
    } else {
        "Unable to determine correct answer from rules. Choose most conservative option."
            .to_string()
    }
}

fn join(letters: &[char]) -> String {
    letters
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

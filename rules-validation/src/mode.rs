//! Answering modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a question is asked and what contract the answer must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Free-form question with cited, quoted answer.
    OpenQa,
    /// Multiple-choice or yes/no question; single-token answer.
    Quiz,
    /// Multiple-choice question answered by eliminating options.
    Elimination,
    /// Full-trace answer with a serializable report.
    Audit,
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenQa => "open_qa",
            Self::Quiz => "quiz",
            Self::Elimination => "elimination",
            Self::Audit => "audit",
        };
        f.write_str(s)
    }
}

/// Unrecognized mode name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown answer mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for AnswerMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open_qa" | "openqa" | "ask" => Ok(Self::OpenQa),
            "quiz" => Ok(Self::Quiz),
            "elimination" | "eliminate" => Ok(Self::Elimination),
            "audit" => Ok(Self::Audit),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("quiz".parse::<AnswerMode>().unwrap(), AnswerMode::Quiz);
        assert_eq!("Open_QA".parse::<AnswerMode>().unwrap(), AnswerMode::OpenQa);
        assert_eq!(
            " eliminate ".parse::<AnswerMode>().unwrap(),
            AnswerMode::Elimination
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!("trivia".parse::<AnswerMode>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for mode in [
            AnswerMode::OpenQa,
            AnswerMode::Quiz,
            AnswerMode::Elimination,
            AnswerMode::Audit,
        ] {
            assert_eq!(mode.to_string().parse::<AnswerMode>().unwrap(), mode);
        }
    }
}

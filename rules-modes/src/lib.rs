//! Answering modes for the rules assistant.
//!
//! Each mode wraps the same pipeline — retrieve, assemble prompt, generate,
//! validate — with its own prompt contract and output shape:
//!
//! - **open QA**: cited, quoted free-form answer
//! - **quiz**: single-token registration-quiz answer with a reasoning log
//! - **elimination**: per-option CORRECT/INCORRECT/UNCERTAIN analysis
//! - **audit**: full serializable trace for debugging and verification

pub mod audit;
pub mod elimination;
pub mod errors;
pub mod generator;
pub mod options;
pub mod prompts;
pub mod quiz;

pub use audit::{AuditMode, AuditReport};
pub use elimination::{EliminationMode, EliminationReport};
pub use errors::ModeError;
pub use generator::{AnswerGenerator, GeneratedAnswer, LlmGenerator, TextGenerator};
pub use options::{OptionAnalysis, OptionStatus, extract_options, parse_analysis, recommendation};
pub use quiz::QuizMode;

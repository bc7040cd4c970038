//! Answer validation for the rules assistant.
//!
//! Generated answers are checked structurally (required sections, citation
//! markers) and against the retrieved evidence (every long double-quoted
//! span must literally appear in some evidence chunk). The validator
//! annotates with a [`Verdict`]; it never rejects or rewrites the answer.

pub mod citations;
pub mod mode;
pub mod validator;
pub mod verdict;

pub use citations::extract_clause_ids;
pub use mode::{AnswerMode, ParseModeError};
pub use validator::AnswerValidator;
pub use verdict::Verdict;

//! Clause-id extraction from answer text.

use std::sync::LazyLock;

use regex::Regex;

/// Rulebook clause ids look like `T.2.3.1`, `EV.5.1`, `A.1`.
static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,3}(?:\.\d+)+\b").unwrap());

/// Extracts cited clause ids from an answer, first-occurrence order,
/// deduplicated. Returns an empty list when nothing matches.
pub fn extract_clause_ids(answer: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in CLAUSE_RE.find_iter(answer) {
        let id = m.as_str();
        if !seen.iter().any(|s| s == id) {
            seen.push(id.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_dotted_clause_ids() {
        let answer = "Per T.2.3.1 and EV.5.1.2, the limit applies. See also T.2.3.1.";
        assert_eq!(extract_clause_ids(answer), vec!["T.2.3.1", "EV.5.1.2"]);
    }

    #[test]
    fn ignores_plain_words_and_numbers() {
        assert_eq!(
            extract_clause_ids("The wheelbase is 1525 mm, see section Chassis."),
            Vec::<String>::new()
        );
    }

    #[test]
    fn requires_at_least_one_numeric_segment() {
        assert!(extract_clause_ids("EV applies here").is_empty());
        assert_eq!(extract_clause_ids("A.1 applies"), vec!["A.1"]);
    }
}

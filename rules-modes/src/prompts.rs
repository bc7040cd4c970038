//! Hard-coded system prompts and context assembly.
//!
//! The prompts enforce citation-based answers; their constraints are
//! non-negotiable for correctness and are not user-configurable.

use std::fmt::Write as _;

use rules_index::RuleChunk;

/// System prompt for open QA mode.
pub const SYSTEM_PROMPT_QA: &str = "You are a Formula Student rules compliance assistant. Your role is to answer questions ONLY based on the official rulebook content provided to you.

STRICT RULES YOU MUST FOLLOW:

1. ONLY use information from the provided rule excerpts
2. NEVER use your general knowledge about Formula Student or engineering
3. ALWAYS cite the specific rule clause number for every claim
4. ALWAYS quote text verbatim from the rules to support your answer
5. If the rules don't explicitly address the question, say \"Not explicitly specified in the rules\"
6. NEVER make inferences, interpretations, or educated guesses
7. NEVER use words like \"typically\", \"usually\", \"best practice\", or \"it is recommended\"

ANSWER FORMAT:

Final Answer:
[Single sentence answer based only on retrieved rules]

Rule References:
- [Document Name] \u{2013} [Clause ID]
- [Additional references if applicable]

Supporting Quotes:
\"[Exact verbatim quote from the rules that supports your answer]\"
\"[Additional quotes if needed]\"

If you cannot answer from the provided rules alone, respond with:

Final Answer:
Not explicitly specified in the rules.

Rule References:
N/A

Supporting Quotes:
N/A

Remember: A wrong answer is worse than admitting uncertainty.";

/// System prompt for registration quiz mode.
pub const SYSTEM_PROMPT_QUIZ: &str = "You are a Formula Student rules compliance assistant answering a registration quiz question.

STRICT RULES YOU MUST FOLLOW:

1. ONLY use information from the provided rule excerpts
2. NEVER use your general knowledge
3. Choose the answer that is MOST directly supported by the rules
4. If no option is clearly supported, choose the safest/most conservative option
5. Your response must be ONLY the letter of your choice (A, B, C, D) or Yes/No

INTERNAL REASONING (do not output):
- Identify relevant rule clauses
- Check each option against the rules
- Find verbatim quotes that support or refute each option
- Select the option most strongly supported

OUTPUT:
Only output the final answer choice (A, B, C, D, or Yes/No). Nothing else.";

/// System prompt for option elimination mode.
pub const SYSTEM_PROMPT_ELIMINATION: &str = "You are a Formula Student rules compliance assistant helping to eliminate incorrect multiple choice options.

STRICT RULES YOU MUST FOLLOW:

1. ONLY use information from the provided rule excerpts
2. For each option, determine if it is:
   - CORRECT: Directly supported by the rules
   - INCORRECT: Contradicted by the rules
   - UNCERTAIN: Not addressed in the provided rules
3. Provide exact rule citations and quotes for your reasoning

ANSWER FORMAT:

Option Analysis:

A) [Option text]
Status: [CORRECT/INCORRECT/UNCERTAIN]
Reasoning: [Brief explanation]
Rule Reference: [Clause ID]
Quote: \"[Verbatim quote if applicable]\"

B) [Option text]
Status: [CORRECT/INCORRECT/UNCERTAIN]
Reasoning: [Brief explanation]
Rule Reference: [Clause ID]
Quote: \"[Verbatim quote if applicable]\"

[Continue for all options]

Recommendation:
[Which option(s) to choose and why]";

/// System prompt for audit mode.
pub const SYSTEM_PROMPT_AUDIT: &str = "You are a Formula Student rules compliance assistant in audit mode.

In this mode, you will:
1. Show all retrieved rule chunks
2. Analyze their relevance to the question
3. Provide a detailed reasoning trace
4. Give the final answer with full citations

This mode is for debugging and verification purposes.

ANSWER FORMAT:

Retrieved Context:
[List all retrieved chunks with metadata]

Relevance Analysis:
[Analyze how each chunk relates to the question]

Reasoning:
[Detailed step-by-step reasoning]

Final Answer:
[Answer based only on retrieved rules]

Rule References:
[All relevant clause IDs]

Supporting Quotes:
[All relevant verbatim quotes]";

fn clause_or_na(chunk: &RuleChunk) -> &str {
    chunk.clause_id.as_deref().unwrap_or("N/A")
}

fn section_or_na(chunk: &RuleChunk) -> &str {
    chunk.section_title.as_deref().unwrap_or("N/A")
}

/// Builds the complete open-QA prompt: system prompt, numbered context,
/// question.
pub fn qa_prompt(question: &str, chunks: &[RuleChunk]) -> String {
    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let _ = writeln!(
            context,
            "[{}] Clause {} - {}\n    Document: {}, Page {}\n    {}\n",
            i + 1,
            clause_or_na(chunk),
            section_or_na(chunk),
            chunk.document_name,
            chunk.page_number,
            chunk.chunk_text,
        );
    }

    format!("{SYSTEM_PROMPT_QA}\n\nRETRIEVED RULES:\n\n{context}\nQUESTION:\n{question}\n\nYOUR ANSWER:")
}

/// Builds the quiz prompt with a compact clause-only context.
pub fn quiz_prompt(question: &str, chunks: &[RuleChunk]) -> String {
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] Clause {}: {}", i + 1, clause_or_na(c), c.chunk_text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{SYSTEM_PROMPT_QUIZ}\n\nRETRIEVED RULES:\n\n{context}\n\nQUESTION:\n{question}\n\nYOUR ANSWER (only the letter or Yes/No):"
    )
}

/// Builds the elimination prompt: context, question, lettered options.
pub fn elimination_prompt(question: &str, options: &[String], chunks: &[RuleChunk]) -> String {
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "[{}] {} - {}\n    {}",
                i + 1,
                clause_or_na(c),
                section_or_na(c),
                c.chunk_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let options_text = options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}) {}", (b'A' + i as u8) as char, opt))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{SYSTEM_PROMPT_ELIMINATION}\n\nRETRIEVED RULES:\n\n{context}\n\nQUESTION:\n{question}\n\nOPTIONS:\n{options_text}\n\nYOUR ANALYSIS:"
    )
}

/// Builds the audit prompt with the full metadata of every chunk.
pub fn audit_prompt(question: &str, chunks: &[RuleChunk]) -> String {
    let mut context = String::new();
    for (i, c) in chunks.iter().enumerate() {
        let _ = writeln!(
            context,
            "CHUNK {}:\n  Chunk ID: {}\n  Document: {}\n  Season: {}\n  Competition: {}\n  Section: {}\n  Clause ID: {}\n  Page: {}\n  Is Table: {}\n  Text:\n{}\n",
            i + 1,
            c.chunk_id,
            c.document_name,
            c.season,
            c.competition,
            section_or_na(c),
            clause_or_na(c),
            c.page_number,
            c.is_table,
            c.chunk_text,
        );
    }

    format!("{SYSTEM_PROMPT_AUDIT}\n\nQUESTION:\n{question}\n\n{context}\nYOUR DETAILED ANALYSIS:")
}

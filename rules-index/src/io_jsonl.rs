//! Strict JSONL reader for chunk rows produced by the offline ingestion step.
//!
//! One row per line: the full chunk schema plus an optional precomputed
//! `embedding`. Rows missing a required field fail the whole read; chunk
//! files are build artifacts and a malformed one should stop ingestion, not
//! be papered over.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::chunk::RuleChunk;
use crate::errors::IndexError;

/// One JSONL row: a chunk plus an optional precomputed embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRow {
    #[serde(flatten)]
    pub chunk: RuleChunk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Reads chunk rows strictly. Empty lines are skipped; any other malformed
/// line is fatal.
///
/// # Errors
/// - [`IndexError::Io`] if the file cannot be read.
/// - [`IndexError::Jsonl`] if any line fails strict deserialization.
pub fn read_chunk_rows(path: impl AsRef<Path>) -> Result<Vec<ChunkRow>, IndexError> {
    info!("reading chunk JSONL: {}", path.as_ref().display());

    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: ChunkRow = serde_json::from_str(&line).map_err(|source| IndexError::Jsonl {
            line: i + 1,
            source,
        })?;
        out.push(row);
    }

    debug!("loaded {} chunk rows", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn reads_rows_and_skips_blank_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"{{"chunk_id":"c1","document_name":"d.pdf","season":"2024","competition":"FSAE","chunk_text":"Text one.","page_number":1,"clause_id":"T.1.1"}}"#
        )
        .unwrap();
        writeln!(f).unwrap();
        writeln!(
            f,
            r#"{{"chunk_id":"c2","document_name":"d.pdf","season":"2024","competition":"FSAE","chunk_text":"Text two.","page_number":2,"embedding":[0.25,0.5]}}"#
        )
        .unwrap();

        let rows = read_chunk_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chunk.clause_id.as_deref(), Some("T.1.1"));
        assert!(rows[0].embedding.is_none());
        assert_eq!(rows[1].embedding.as_deref(), Some(&[0.25, 0.5][..]));
        // Optional fields default cleanly.
        assert!(!rows[1].chunk.is_table);
    }

    #[test]
    fn malformed_row_is_fatal_with_line_number() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"{{"chunk_id":"c1","document_name":"d.pdf","season":"2024","competition":"FSAE","chunk_text":"Text.","page_number":1}}"#
        )
        .unwrap();
        writeln!(f, r#"{{"chunk_id":"c2"}}"#).unwrap();

        let err = read_chunk_rows(f.path()).unwrap_err();
        assert!(matches!(err, IndexError::Jsonl { line: 2, .. }));
    }
}

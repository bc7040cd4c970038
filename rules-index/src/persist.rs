//! Durable index layout: binary vector file + JSON metadata sidecar.
//!
//! Two co-located artifacts per scope:
//! - `vectors.bin` — header (magic, version, dim, count) followed by the flat
//!   little-endian f32 arena.
//! - `metadata.json` — ordered chunk sequence plus the bound scope and
//!   dimensionality.
//!
//! Both must be present and agree; any disagreement is [`IndexError::CorruptIndex`].

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::chunk::{RuleChunk, Scope};
use crate::errors::IndexError;
use crate::index::RuleIndex;

const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";

const MAGIC: &[u8; 8] = b"FSRIDX\x00\x01";

#[derive(Serialize, Deserialize)]
struct Metadata {
    embedding_dim: usize,
    season: Option<String>,
    competition: Option<String>,
    chunks: Vec<RuleChunk>,
}

impl RuleIndex {
    /// Persists the index into `dir`, creating it if needed.
    ///
    /// # Errors
    /// [`IndexError::Io`] / [`IndexError::Parse`] on write failures.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), IndexError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut w = BufWriter::new(File::create(dir.join(VECTORS_FILE))?);
        w.write_all(MAGIC)?;
        w.write_u32::<LittleEndian>(self.dim as u32)?;
        w.write_u32::<LittleEndian>(self.chunks.len() as u32)?;
        for v in &self.vectors {
            w.write_f32::<LittleEndian>(*v)?;
        }
        w.flush()?;

        let meta = Metadata {
            embedding_dim: self.dim,
            season: self.scope.as_ref().map(|s| s.season.clone()),
            competition: self.scope.as_ref().map(|s| s.competition.clone()),
            chunks: self.chunks.clone(),
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(dir.join(METADATA_FILE))?), &meta)?;

        info!(
            "saved index to {} ({} chunks, dim={})",
            dir.display(),
            self.chunks.len(),
            self.dim
        );
        Ok(())
    }

    /// Loads an index previously written by [`RuleIndex::save`].
    ///
    /// # Errors
    /// [`IndexError::CorruptIndex`] if either artifact is missing, the vector
    /// file header is invalid or truncated, or the vector count disagrees
    /// with the metadata chunk count.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        let dir = dir.as_ref();
        let vectors_path = dir.join(VECTORS_FILE);
        let metadata_path = dir.join(METADATA_FILE);
        if !vectors_path.exists() || !metadata_path.exists() {
            return Err(IndexError::CorruptIndex(format!(
                "both {VECTORS_FILE} and {METADATA_FILE} must be present in {}",
                dir.display()
            )));
        }

        let meta: Metadata = serde_json::from_reader(BufReader::new(File::open(&metadata_path)?))?;

        let mut r = BufReader::new(File::open(&vectors_path)?);
        let mut magic = [0u8; 8];
        read_or_corrupt(&mut r, &mut magic)?;
        if &magic != MAGIC {
            return Err(IndexError::CorruptIndex(
                "unrecognized vector file magic".into(),
            ));
        }
        let dim = r.read_u32::<LittleEndian>()? as usize;
        let count = r.read_u32::<LittleEndian>()? as usize;
        if dim != meta.embedding_dim {
            return Err(IndexError::CorruptIndex(format!(
                "vector file dim {dim} does not match metadata dim {}",
                meta.embedding_dim
            )));
        }
        if count != meta.chunks.len() {
            return Err(IndexError::CorruptIndex(format!(
                "vector count {count} does not match metadata chunk count {}",
                meta.chunks.len()
            )));
        }

        let mut vectors = vec![0f32; dim * count];
        r.read_f32_into::<LittleEndian>(&mut vectors)
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => {
                    IndexError::CorruptIndex("vector file shorter than header declares".into())
                }
                _ => IndexError::Io(e),
            })?;
        let mut probe = [0u8; 1];
        if r.read(&mut probe)? != 0 {
            return Err(IndexError::CorruptIndex(
                "vector file longer than header declares".into(),
            ));
        }

        let scope = match (meta.season, meta.competition) {
            (Some(season), Some(competition)) => Some(Scope {
                season,
                competition,
            }),
            _ => None,
        };

        debug!(
            "loaded index from {} ({} chunks, dim={})",
            dir.display(),
            count,
            dim
        );
        Ok(RuleIndex {
            dim,
            scope,
            chunks: meta.chunks,
            vectors,
        })
    }
}

fn read_or_corrupt(r: &mut impl Read, buf: &mut [u8]) -> Result<(), IndexError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => IndexError::CorruptIndex("vector file truncated".into()),
        _ => IndexError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_index() -> RuleIndex {
        let mut idx = RuleIndex::new(3);
        idx.add(
            vec![
                RuleChunk {
                    chunk_id: "2024_FSAE_00001".to_string(),
                    document_name: "FSAE_Rules_2024.pdf".to_string(),
                    season: "2024".to_string(),
                    competition: "FSAE".to_string(),
                    chunk_text: "The minimum wheelbase is 1525 mm.".to_string(),
                    page_number: 12,
                    section_title: Some("Chassis".to_string()),
                    clause_id: Some("T.2.3.1".to_string()),
                    is_table: false,
                    word_count: 6,
                },
                RuleChunk {
                    chunk_id: "2024_FSAE_00002".to_string(),
                    document_name: "FSAE_Rules_2024.pdf".to_string(),
                    season: "2024".to_string(),
                    competition: "FSAE".to_string(),
                    chunk_text: "The brake light is mandatory.".to_string(),
                    page_number: 40,
                    section_title: None,
                    clause_id: Some("T.1.1".to_string()),
                    is_table: false,
                    word_count: 5,
                },
            ],
            vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
        )
        .unwrap();
        idx
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let idx = sample_index();
        idx.save(dir.path()).unwrap();

        let loaded = RuleIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.dim(), idx.dim());
        assert_eq!(loaded.scope(), idx.scope());
        assert_eq!(loaded.chunks(), idx.chunks());
        assert_eq!(loaded.vectors, idx.vectors);
    }

    #[test]
    fn load_rejects_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(METADATA_FILE)).unwrap();

        let err = RuleIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::CorruptIndex(_)));
    }

    #[test]
    fn load_rejects_count_disagreement() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        // Drop one chunk from the sidecar so the counts disagree.
        let path = dir.path().join(METADATA_FILE);
        let mut meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        meta["chunks"].as_array_mut().unwrap().pop();
        std::fs::write(&path, serde_json::to_string(&meta).unwrap()).unwrap();

        let err = RuleIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::CorruptIndex(_)));
    }

    #[test]
    fn load_rejects_truncated_vector_file() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        let path = dir.path().join(VECTORS_FILE);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let err = RuleIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::CorruptIndex(_)));
    }
}

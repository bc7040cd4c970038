//! Flat L2 index bound to at most one season/competition scope.

use serde::Serialize;
use tracing::{debug, trace};

use crate::chunk::{RuleChunk, Scope};
use crate::errors::IndexError;

/// A single search hit: the chunk plus its Euclidean distance to the query.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub chunk: RuleChunk,
    pub distance: f32,
}

/// Exact nearest-neighbor index over rule chunks.
///
/// The chunk sequence and the vector arena stay parallel by insertion
/// position; `chunks.len() * dim == vectors.len()` holds at all times.
/// The scope may be unbound at construction and becomes binding with the
/// first insertion.
///
/// Built once during offline ingestion, persisted, then loaded read-only for
/// serving. No method besides [`RuleIndex::add`] mutates the index, so a
/// loaded index may be shared freely between concurrent readers.
#[derive(Debug)]
pub struct RuleIndex {
    pub(crate) dim: usize,
    pub(crate) scope: Option<Scope>,
    pub(crate) chunks: Vec<RuleChunk>,
    pub(crate) vectors: Vec<f32>,
}

impl RuleIndex {
    /// Creates an empty index for vectors of the given dimensionality.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            scope: None,
            chunks: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Creates an empty index pre-bound to a scope.
    pub fn with_scope(dim: usize, scope: Scope) -> Self {
        Self {
            dim,
            scope: Some(scope),
            chunks: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Embedding dimensionality, fixed at construction.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The bound scope, if any chunk has been inserted (or the index was
    /// pre-bound).
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The ordered chunk sequence, by insertion position.
    pub fn chunks(&self) -> &[RuleChunk] {
        &self.chunks
    }

    /// Appends a batch of chunks with their embedding vectors.
    ///
    /// The whole batch is validated before anything is appended: on error the
    /// index is unchanged, no partial insertion is ever visible. If the scope
    /// is still unbound, the first chunk of the batch binds it.
    ///
    /// # Errors
    /// - [`IndexError::DimensionMismatch`] if the batch lengths disagree or
    ///   any vector's length differs from the index dimensionality.
    /// - [`IndexError::ScopeViolation`] if any chunk's season/competition
    ///   differs from the bound scope.
    pub fn add(&mut self, chunks: Vec<RuleChunk>, vectors: Vec<Vec<f32>>) -> Result<(), IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::DimensionMismatch {
                got: vectors.len(),
                want: chunks.len(),
            });
        }
        for v in &vectors {
            if v.len() != self.dim {
                return Err(IndexError::DimensionMismatch {
                    got: v.len(),
                    want: self.dim,
                });
            }
        }

        let scope = match (&self.scope, chunks.first()) {
            (Some(s), _) => s.clone(),
            (None, Some(first)) => first.scope(),
            (None, None) => return Ok(()),
        };
        for c in &chunks {
            if !c.in_scope(&scope) {
                return Err(IndexError::ScopeViolation {
                    chunk_id: c.chunk_id.clone(),
                    got: c.scope().to_string(),
                    want: scope.to_string(),
                });
            }
        }

        self.scope = Some(scope);
        for v in &vectors {
            self.vectors.extend_from_slice(v);
        }
        self.chunks.extend(chunks);
        debug!("index add: total={} dim={}", self.chunks.len(), self.dim);
        Ok(())
    }

    /// Returns up to `k` hits ordered by ascending Euclidean distance.
    ///
    /// Exact ties are broken by insertion position, earlier wins. An empty
    /// index yields an empty result.
    ///
    /// # Errors
    /// [`IndexError::DimensionMismatch`] if the query vector's length differs
    /// from the index dimensionality.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = (0..self.chunks.len())
            .map(|i| {
                let row = &self.vectors[i * self.dim..(i + 1) * self.dim];
                (l2_distance(query, row), i)
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        trace!("index search: k={} hits={}", k, scored.len());
        Ok(scored
            .into_iter()
            .map(|(distance, i)| SearchHit {
                chunk: self.chunks[i].clone(),
                distance,
            })
            .collect())
    }

    /// Aggregate counters over the chunk sequence.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_chunks: self.chunks.len(),
            embedding_dim: self.dim,
            season: self.scope.as_ref().map(|s| s.season.clone()),
            competition: self.scope.as_ref().map(|s| s.competition.clone()),
            with_clause_id: self.chunks.iter().filter(|c| c.clause_id.is_some()).count(),
            with_section_title: self
                .chunks
                .iter()
                .filter(|c| c.section_title.is_some())
                .count(),
            tables: self.chunks.iter().filter(|c| c.is_table).count(),
        }
    }
}

/// Snapshot of index composition, used by the `stats` reporting surface.
#[derive(Clone, Debug, Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub embedding_dim: usize,
    pub season: Option<String>,
    pub competition: Option<String>,
    pub with_clause_id: usize,
    pub with_section_title: usize,
    pub tables: usize,
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(id: &str, season: &str, competition: &str) -> RuleChunk {
        RuleChunk {
            chunk_id: id.to_string(),
            document_name: "FSAE_Rules_2024.pdf".to_string(),
            season: season.to_string(),
            competition: competition.to_string(),
            chunk_text: format!("rule text for {id}"),
            page_number: 1,
            section_title: None,
            clause_id: None,
            is_table: false,
            word_count: 4,
        }
    }

    #[test]
    fn add_then_search_returns_every_chunk() {
        let mut idx = RuleIndex::new(2);
        idx.add(
            vec![
                chunk("c1", "2024", "FSAE"),
                chunk("c2", "2024", "FSAE"),
                chunk("c3", "2024", "FSAE"),
            ],
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 2.0]],
        )
        .unwrap();

        let hits = idx.search(&[0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.chunk_id, "c1");
        assert_eq!(hits[1].chunk.chunk_id, "c2");
        assert_eq!(hits[2].chunk.chunk_id, "c3");
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn ties_prefer_earlier_insertion() {
        let mut idx = RuleIndex::new(2);
        idx.add(
            vec![chunk("first", "2024", "FSAE"), chunk("second", "2024", "FSAE")],
            vec![vec![1.0, 0.0], vec![-1.0, 0.0]],
        )
        .unwrap();

        let hits = idx.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.chunk_id, "first");
        assert_eq!(hits[1].chunk.chunk_id, "second");
    }

    #[test]
    fn empty_index_searches_empty() {
        let idx = RuleIndex::new(3);
        assert!(idx.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_wrong_query_dim() {
        let idx = RuleIndex::new(3);
        let err = idx.search(&[0.0, 0.0], 5).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch { got: 2, want: 3 }
        ));
    }

    #[test]
    fn add_rejects_batch_length_disagreement() {
        let mut idx = RuleIndex::new(2);
        let err = idx
            .add(vec![chunk("c1", "2024", "FSAE")], vec![])
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
        assert!(idx.is_empty());
    }

    #[test]
    fn add_rejects_wrong_vector_dim() {
        let mut idx = RuleIndex::new(2);
        let err = idx
            .add(vec![chunk("c1", "2024", "FSAE")], vec![vec![1.0, 2.0, 3.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch { got: 3, want: 2 }
        ));
    }

    #[test]
    fn first_insertion_binds_scope() {
        let mut idx = RuleIndex::new(1);
        assert!(idx.scope().is_none());
        idx.add(vec![chunk("c1", "2024", "FSAE")], vec![vec![0.5]])
            .unwrap();
        assert_eq!(idx.scope().unwrap(), &Scope::new("2024", "FSAE"));

        let err = idx
            .add(vec![chunk("c2", "2025", "FSAE")], vec![vec![0.5]])
            .unwrap_err();
        assert!(matches!(err, IndexError::ScopeViolation { .. }));
    }

    #[test]
    fn foreign_scope_batch_leaves_index_unchanged() {
        let mut idx = RuleIndex::with_scope(1, Scope::new("2024", "FSAE"));
        let err = idx
            .add(
                vec![chunk("ok", "2024", "FSAE"), chunk("bad", "2024", "FS")],
                vec![vec![0.1], vec![0.2]],
            )
            .unwrap_err();
        assert!(matches!(err, IndexError::ScopeViolation { .. }));
        // All-or-nothing: the valid chunk must not have been inserted.
        assert_eq!(idx.len(), 0);
        assert_eq!(idx.vectors.len(), 0);
    }

    #[test]
    fn stats_counts_metadata() {
        let mut idx = RuleIndex::new(1);
        let mut tagged = chunk("c1", "2024", "FSAE");
        tagged.clause_id = Some("T.1.1".to_string());
        tagged.section_title = Some("Brakes".to_string());
        let mut table = chunk("c2", "2024", "FSAE");
        table.is_table = true;
        idx.add(vec![tagged, table], vec![vec![0.0], vec![1.0]])
            .unwrap();

        let stats = idx.stats();
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.with_clause_id, 1);
        assert_eq!(stats.with_section_title, 1);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.season.as_deref(), Some("2024"));
    }
}

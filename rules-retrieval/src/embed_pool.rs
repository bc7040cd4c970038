//! Embedding executor with concurrency and dimension checks.

use futures::stream::{self, StreamExt};
use rules_index::{ChunkRow, IndexError};
use tracing::{debug, info};

use crate::{embed::EmbeddingsProvider, errors::RetrievalError};

/// Embeds chunk texts for rows that have no precomputed vectors.
///
/// # Arguments
/// - `rows`: mutable slice of chunk rows from JSONL ingestion.
/// - `provider`: embedding backend.
/// - `expected_dim`: if `Some`, enforces this vector size (error on mismatch),
///   applied to precomputed vectors as well.
/// - `concurrency`: maximum number of concurrent embedding requests.
///
/// # Errors
/// [`RetrievalError::Index`] with `DimensionMismatch` on a wrong-sized
/// vector, or [`RetrievalError::Embedding`] if the provider fails.
pub async fn embed_missing(
    rows: &mut [ChunkRow],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<(), RetrievalError> {
    info!(
        total = rows.len(),
        concurrency, "embed_missing: filling missing vectors"
    );

    if let Some(want) = expected_dim {
        for row in rows.iter() {
            if let Some(v) = &row.embedding {
                if v.len() != want {
                    return Err(IndexError::DimensionMismatch { got: v.len(), want }.into());
                }
            }
        }
    }

    let idxs: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| if r.embedding.is_none() { Some(i) } else { None })
        .collect();

    if idxs.is_empty() {
        debug!("embed_missing: nothing to embed");
        return Ok(());
    }

    let results: Vec<(usize, Vec<f32>)> = stream::iter(idxs.into_iter())
        .map(|i| {
            let text = rows[i].chunk.chunk_text.clone();
            async move {
                let v = provider.embed(&text).await?;
                Ok::<(usize, Vec<f32>), RetrievalError>((i, v))
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RetrievalError>>()?;

    for (i, v) in results {
        if let Some(want) = expected_dim {
            if v.len() != want {
                return Err(IndexError::DimensionMismatch { got: v.len(), want }.into());
            }
        }
        rows[i].embedding = Some(v);
    }

    debug!("embed_missing: embeddings filled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::tests::StubEmbedder;
    use rules_index::RuleChunk;

    fn row(id: &str, text: &str, embedding: Option<Vec<f32>>) -> ChunkRow {
        ChunkRow {
            chunk: RuleChunk {
                chunk_id: id.to_string(),
                document_name: "FS-Rules_2024_v1.1.pdf".to_string(),
                season: "2024".to_string(),
                competition: "FSG".to_string(),
                chunk_text: text.to_string(),
                page_number: 1,
                section_title: None,
                clause_id: None,
                is_table: false,
                word_count: text.split_whitespace().count(),
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn fills_only_missing_vectors() {
        let mut rows = vec![
            row("c1", "alpha", Some(vec![9.0, 9.0, 9.0])),
            row("c2", "beta", None),
        ];
        let provider = StubEmbedder::constant(vec![1.0, 2.0, 3.0]);

        embed_missing(&mut rows, &provider, Some(3), 4).await.unwrap();

        assert_eq!(rows[0].embedding, Some(vec![9.0, 9.0, 9.0]));
        assert_eq!(rows[1].embedding, Some(vec![1.0, 2.0, 3.0]));
    }

    #[tokio::test]
    async fn rejects_wrong_dim_precomputed_vector() {
        let mut rows = vec![row("c1", "alpha", Some(vec![1.0, 2.0]))];
        let provider = StubEmbedder::constant(vec![1.0, 2.0, 3.0]);

        let err = embed_missing(&mut rows, &provider, Some(3), 2)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RetrievalError::Index(IndexError::DimensionMismatch { got: 2, want: 3 })
        ));
    }
}

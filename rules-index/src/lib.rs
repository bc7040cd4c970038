//! Scope-isolated vector index for Formula Student rulebook chunks.
//!
//! One [`RuleIndex`] holds the chunks and embedding vectors of exactly one
//! season/competition scope. It never mixes scopes: the first insertion binds
//! the scope and every later insertion must match it exactly. Search is exact
//! nearest-neighbor by Euclidean distance over a flat vector arena.
//!
//! The crate also provides:
//! - Durable persistence (binary vector file + JSON metadata sidecar)
//! - A strict JSONL reader for chunk rows produced by offline ingestion
//! - Content-quality validation of ingested chunks

mod chunk;
mod errors;
mod index;
mod io_jsonl;
mod persist;
mod validate;

pub use chunk::{RuleChunk, Scope};
pub use errors::IndexError;
pub use index::{IndexStats, RuleIndex, SearchHit};
pub use io_jsonl::{ChunkRow, read_chunk_rows};
pub use validate::{ChunkFinding, ChunkValidator, FindingKind, Severity};

//! Vector index abstraction shared by the Qdrant and in-memory backends.

use futures::future::BoxFuture;

use crate::config::IndexSpace;
use crate::errors::RagError;
use crate::filters::MetadataFilter;
use crate::record::{DocumentUnit, EmbeddingVector, IndexedEntry, RetrievalResult};

/// Keyed store of embedded units with similarity search.
///
/// Contract for every implementation:
/// - upsert by key replaces, never duplicates;
/// - `search` with `k == 0` is `InvalidQuery`, `k` above the entry count returns all;
/// - results are ordered by non-increasing score, equal scores by key;
/// - vectors are checked against [`VectorIndex::space`] on upsert and search.
pub trait VectorIndex: Send + Sync {
    fn space(&self) -> &IndexSpace;

    /// Returns the number of entries written.
    fn upsert<'a>(&'a self, entries: Vec<IndexedEntry>) -> BoxFuture<'a, Result<usize, RagError>>;

    fn search<'a>(
        &'a self,
        query: &'a EmbeddingVector,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievalResult>, RagError>>;

    fn count<'a>(&'a self) -> BoxFuture<'a, Result<usize, RagError>>;

    /// Removes entries by key. Unknown keys are ignored.
    fn delete<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, Result<usize, RagError>>;
}

/// Shared pre-search validation.
pub(crate) fn check_search(
    space: &IndexSpace,
    query: &EmbeddingVector,
    k: usize,
) -> Result<(), RagError> {
    if k == 0 {
        return Err(RagError::InvalidQuery("k must be >= 1".into()));
    }
    space.check(query)
}

pub(crate) fn check_entries(space: &IndexSpace, entries: &[IndexedEntry]) -> Result<(), RagError> {
    entries.iter().try_for_each(|e| space.check(&e.vector))
}

/// Orders by score desc then key asc, keeps `k`, assigns ranks from 1.
pub(crate) fn rank_hits(mut hits: Vec<(f32, DocumentUnit)>, k: usize) -> Vec<RetrievalResult> {
    hits.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.key.cmp(&b.1.key)));
    hits.truncate(k);
    hits.into_iter()
        .enumerate()
        .map(|(i, (score, unit))| RetrievalResult {
            unit,
            score,
            rank: i + 1,
        })
        .collect()
}

//! In-process exact-search index. Used for tests and offline runs.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::config::IndexSpace;
use crate::errors::RagError;
use crate::filters::MetadataFilter;
use crate::index::{VectorIndex, check_entries, check_search, rank_hits};
use crate::record::{EmbeddingVector, IndexedEntry, RetrievalResult};

pub struct MemoryIndex {
    space: IndexSpace,
    entries: RwLock<BTreeMap<String, IndexedEntry>>,
}

impl MemoryIndex {
    pub fn new(space: IndexSpace) -> Self {
        Self {
            space,
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl VectorIndex for MemoryIndex {
    fn space(&self) -> &IndexSpace {
        &self.space
    }

    fn upsert<'a>(&'a self, entries: Vec<IndexedEntry>) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            check_entries(&self.space, &entries)?;
            let n = entries.len();
            let mut w = self.entries.write().await;
            for e in entries {
                w.insert(e.unit.key.clone(), e);
            }
            debug!(upserted = n, total = w.len(), "memory index upsert");
            Ok(n)
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a EmbeddingVector,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievalResult>, RagError>> {
        Box::pin(async move {
            check_search(&self.space, query, k)?;
            let r = self.entries.read().await;
            let hits = r
                .values()
                .filter(|e| filter.is_none_or(|f| f.matches(&e.unit.metadata)))
                .map(|e| {
                    let score = self.space.distance.score(&query.values, &e.vector.values);
                    (score, e.unit.clone())
                })
                .collect::<Vec<_>>();
            trace!(candidates = hits.len(), k, "memory index search");
            Ok(rank_hits(hits, k))
        })
    }

    fn count<'a>(&'a self) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move { Ok(self.entries.read().await.len()) })
    }

    fn delete<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            let mut w = self.entries.write().await;
            Ok(keys.iter().filter(|k| w.remove(k.as_str()).is_some()).count())
        })
    }
}

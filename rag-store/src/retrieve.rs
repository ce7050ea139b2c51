//! Retrieval: embed the question, overfetch candidates, then filter, dedupe and rank.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::MetadataFilter;
use crate::index::VectorIndex;
use crate::record::RetrievalResult;

/// Question → ranked, deduplicated units.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    overfetch: usize,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
        overfetch: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            overfetch: overfetch.max(1),
        }
    }

    /// Top `k` units for `question`, at most one per record, none scoring below `min_score`.
    ///
    /// An empty result is a valid outcome.
    ///
    /// # Errors
    /// - `InvalidQuery` when `k == 0`
    /// - `ModelMismatch` when the embedder differs from the index model (checked first)
    /// - embedding or index failures
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        min_score: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidQuery("k must be >= 1".into()));
        }
        let space = self.index.space();
        if self.embedder.model_id() != space.model {
            return Err(RagError::ModelMismatch {
                got: self.embedder.model_id().to_string(),
                want: space.model.clone(),
            });
        }

        let query = self.embedder.embed(question).await?;
        let n = k.saturating_mul(self.overfetch).max(k);
        trace!(k, n, min_score, "retrieve: searching candidates");

        let candidates = self.index.search(&query, n, filter).await?;
        let out = rank_candidates(candidates, k, min_score);

        debug!(k, returned = out.len(), "retrieve: done");
        Ok(out)
    }
}

/// Drops NaN and sub-threshold scores, keeps the best unit per record
/// (ties by original rank), truncates to `k` and re-ranks from 1.
pub fn rank_candidates(
    mut candidates: Vec<RetrievalResult>,
    k: usize,
    min_score: f32,
) -> Vec<RetrievalResult> {
    candidates.retain(|c| !c.score.is_nan() && c.score >= min_score);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.rank.cmp(&b.rank)));

    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates.retain(|c| seen.insert(c.unit.record_id.clone()));
    candidates.truncate(k);

    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistanceKind, IndexSpace};
    use crate::embed::hash_embedder::HashEmbedder;
    use crate::memory_index::MemoryIndex;
    use crate::record::{DocumentUnit, EmbeddingVector, IndexedEntry};
    use ai_llm_service::AiLlmError;
    use futures::future::BoxFuture;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn result(record: &str, idx: usize, score: f32, rank: usize) -> RetrievalResult {
        RetrievalResult {
            unit: DocumentUnit::new(record, idx, format!("{record} unit {idx}"), BTreeMap::new()),
            score,
            rank,
        }
    }

    async fn indexed(emb: &HashEmbedder, docs: &[(&str, &str)]) -> Arc<MemoryIndex> {
        let idx = Arc::new(MemoryIndex::new(IndexSpace::new(
            emb.dim(),
            DistanceKind::Cosine,
            emb.model_id(),
        )));
        let mut entries = Vec::new();
        for (record, text) in docs {
            entries.push(IndexedEntry {
                vector: emb.embed(text).await.unwrap(),
                unit: DocumentUnit::new(*record, 0, *text, BTreeMap::new()),
            });
        }
        idx.upsert(entries).await.unwrap();
        idx
    }

    fn retriever(idx: Arc<MemoryIndex>, emb: HashEmbedder) -> Retriever {
        Retriever::new(idx, Arc::new(emb), 3)
    }

    #[test]
    fn relevance_floor_and_nan_are_dropped() {
        let out = rank_candidates(
            vec![
                result("a", 0, 0.9, 1),
                result("b", 0, f32::NAN, 2),
                result("c", 0, 0.2, 3),
            ],
            10,
            0.5,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].unit.record_id, "a");
        assert!(out.iter().all(|r| r.score >= 0.5));
    }

    #[test]
    fn dedupe_keeps_best_unit_per_record() {
        let out = rank_candidates(
            vec![
                result("a", 0, 0.8, 1),
                result("a", 1, 0.9, 2),
                result("b", 0, 0.7, 3),
                result("b", 1, 0.7, 4),
            ],
            10,
            0.0,
        );
        let keys: Vec<_> = out.iter().map(|r| r.unit.key.as_str()).collect();
        assert_eq!(keys, ["a#1", "b#0"]);
        assert_eq!(out.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn truncates_after_dedupe() {
        let out = rank_candidates(
            vec![
                result("a", 0, 0.9, 1),
                result("a", 1, 0.8, 2),
                result("b", 0, 0.7, 3),
                result("c", 0, 0.6, 4),
            ],
            2,
            0.0,
        );
        let ids: Vec<_> = out.iter().map(|r| r.unit.record_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn single_record_is_retrieved_verbatim() {
        let emb = HashEmbedder::new(128);
        let text = "Tire pressures: front 22.0 PSI, rear 21.8 PSI. Coolant temperature 87.3 C.";
        let idx = indexed(&emb, &[("r1", text)]).await;
        let out = retriever(idx, emb)
            .retrieve("what is the coolant temperature", 1, 0.0, None)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rank, 1);
        for v in ["22.0", "21.8", "87.3"] {
            assert!(out[0].unit.text.contains(v));
        }
    }

    #[tokio::test]
    async fn empty_index_yields_empty_result() {
        let emb = HashEmbedder::new(64);
        let idx = indexed(&emb, &[]).await;
        let out = retriever(idx, emb)
            .retrieve("anything", 5, 0.0, None)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn zero_k_is_rejected() {
        let emb = HashEmbedder::new(64);
        let idx = indexed(&emb, &[("r1", "text")]).await;
        let err = retriever(idx, emb)
            .retrieve("q", 0, 0.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn identical_records_are_both_returned() {
        let emb = HashEmbedder::new(64);
        let text = "front 22.0 rear 21.8";
        let idx = indexed(&emb, &[("r1", text), ("r2", text)]).await;
        let out = retriever(idx, emb)
            .retrieve(text, 5, 0.0, None)
            .await
            .unwrap();
        let keys: Vec<_> = out.iter().map(|r| r.unit.key.as_str()).collect();
        assert_eq!(keys, ["r1#0", "r2#0"]);
        assert_eq!(out[0].score, out[1].score);
    }

    #[tokio::test]
    async fn model_mismatch_fails_before_search() {
        let emb = HashEmbedder::new(64);
        let idx = indexed(&emb, &[("r1", "text")]).await;
        let other = HashEmbedder::new(32);
        let err = Retriever::new(idx, Arc::new(other), 3)
            .retrieve("q", 1, 0.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::ModelMismatch { .. }));
    }

    struct Down;

    impl EmbeddingsProvider for Down {
        fn model_id(&self) -> &str {
            "hash:blake3-64"
        }

        fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<EmbeddingVector, RagError>> {
            Box::pin(async {
                Err(AiLlmError::RetriesExhausted {
                    op: "embed",
                    attempts: 3,
                    last: Box::new(AiLlmError::Timeout(Duration::from_secs(1))),
                }
                .into())
            })
        }
    }

    #[tokio::test]
    async fn unavailable_embedder_fails_the_query() {
        let emb = HashEmbedder::new(64);
        let idx = indexed(&emb, &[("r1", "text")]).await;
        let err = Retriever::new(idx, Arc::new(Down), 3)
            .retrieve("q", 1, 0.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::EmbeddingUnavailable);
    }
}

//! High-level RAG facade: ingestion + retrieval over a vector index.
//!
//! This crate provides a clean API to:
//! - Embed [`DocumentUnit`]s and upsert them idempotently by key
//! - Retrieve the top‑K units for a question, deduplicated per record
//!
//! Two index backends implement [`VectorIndex`]: [`QdrantIndex`] (production) and
//! [`MemoryIndex`] (tests, offline runs). Two embedders implement
//! [`EmbeddingsProvider`]: [`LlmEmbedder`] (Ollama/OpenAI) and [`HashEmbedder`].

mod config;
mod embed;
mod embed_pool;
mod errors;
mod filters;
mod index;
mod ingest;
mod io_jsonl;
mod memory_index;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::{DistanceKind, IndexSpace, RagConfig, VectorBackend};
pub use embed::{EmbeddingsProvider, hash_embedder::HashEmbedder, llm::LlmEmbedder};
pub use embed_pool::{EmbedOutcome, embed_units};
pub use errors::{ErrorKind, RagError};
pub use filters::{MetadataFilter, NumericRange};
pub use index::VectorIndex;
pub use ingest::IngestReport;
pub use io_jsonl::{JsonlRows, read_jsonl_rows};
pub use memory_index::MemoryIndex;
pub use qdrant_facade::QdrantIndex;
pub use record::{
    DocumentUnit, EmbeddingVector, IndexedEntry, RetrievalResult, SkippedItem, stable_uuid,
    unit_key,
};
pub use retrieve::{Retriever, rank_candidates};

use std::sync::Arc;

use tracing::{debug, info, trace};

/// High-level facade that wires configuration, index and embedder.
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    cfg: RagConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl RagStore {
    /// Opens the configured backend. The index space takes the embedder's model id.
    ///
    /// # Errors
    /// Returns `RagError::Config` on invalid configuration or client init failure.
    pub fn open(
        cfg: RagConfig,
        backend: VectorBackend,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        info!(
            %backend,
            collection = %cfg.collection,
            model = embedder.model_id(),
            dim = cfg.embedding_dim,
            "RagStore::open"
        );
        let index: Arc<dyn VectorIndex> = match backend {
            VectorBackend::Qdrant => Arc::new(QdrantIndex::new(&cfg, embedder.model_id())?),
            VectorBackend::Memory => Arc::new(MemoryIndex::new(IndexSpace::new(
                cfg.embedding_dim,
                cfg.distance,
                embedder.model_id(),
            ))),
        };
        Ok(Self {
            cfg,
            index,
            embedder,
        })
    }

    /// Wires an already constructed index.
    pub fn with_index(
        cfg: RagConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Self {
        Self {
            cfg,
            index,
            embedder,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingsProvider> {
        &self.embedder
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            self.index.clone(),
            self.embedder.clone(),
            self.cfg.overfetch,
        )
    }

    /// Embeds and upserts units in batches.
    ///
    /// # Errors
    /// Model/dimension mismatches and index failures; per-unit embedding outages
    /// are reported in [`IngestReport::skipped`] instead.
    pub async fn ingest_units(&self, units: Vec<DocumentUnit>) -> Result<IngestReport, RagError> {
        debug!("RagStore::ingest_units units={}", units.len());
        ingest::ingest_units(&self.cfg, self.index.as_ref(), self.embedder.as_ref(), units).await
    }

    /// See [`Retriever::retrieve`].
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        min_score: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, RagError> {
        trace!("RagStore::retrieve k={k} min_score={min_score}");
        self.retriever()
            .retrieve(question, k, min_score, filter)
            .await
    }

    pub async fn count(&self) -> Result<usize, RagError> {
        self.index.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn store() -> RagStore {
        let mut cfg = RagConfig::new_default("http://127.0.0.1:6334", "test");
        cfg.embedding_dim = 64;
        RagStore::open(cfg, VectorBackend::Memory, Arc::new(HashEmbedder::new(64))).unwrap()
    }

    #[tokio::test]
    async fn ingest_then_retrieve() {
        let store = store();
        let units = vec![
            DocumentUnit::new("a", 0, "coolant temperature 87.3 C", BTreeMap::new()),
            DocumentUnit::new("b", 0, "driver weight 70.0 kg", BTreeMap::new()),
        ];
        let report = store.ingest_units(units).await.unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let hits = store.retrieve("coolant temperature", 1, 0.1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].unit.record_id, "a");
    }

    #[test]
    fn open_rejects_bad_config() {
        let mut cfg = RagConfig::new_default("http://127.0.0.1:6334", "test");
        cfg.overfetch = 0;
        let res = RagStore::open(cfg, VectorBackend::Memory, Arc::new(HashEmbedder::new(8)));
        assert!(matches!(res, Err(RagError::Config(_))));
    }
}

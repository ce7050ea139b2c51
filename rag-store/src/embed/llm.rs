//! Embedding provider backed by the shared LLM service (Ollama or OpenAI).
//!
//! Retries and per-call timeouts are applied by [`LlmServiceProfiles`]; this adapter
//! only stamps the model id and enforces the expected dimension.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::record::EmbeddingVector;

#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    model: String,
    dim: usize,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: usize) -> Self {
        let model = svc.embedding_model_id();
        Self { svc, model, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<EmbeddingVector, RagError>> {
        Box::pin(async move {
            let values = self.svc.embed(text).await?;
            if values.len() != self.dim {
                warn!(
                    got = values.len(),
                    want = self.dim,
                    model = %self.model,
                    "embedding dimension differs from configuration"
                );
                return Err(RagError::VectorSizeMismatch {
                    got: values.len(),
                    want: self.dim,
                });
            }
            debug!(dim = values.len(), "embedded text of {} chars", text.len());
            Ok(EmbeddingVector::new(values, self.model.clone()))
        })
    }
}

//! Embedding abstraction.
//!
//! Async is required because real providers (Ollama, OpenAI) perform HTTP requests.

use futures::future::BoxFuture;

use crate::errors::RagError;
use crate::record::EmbeddingVector;

/// Provider interface for embedding generation.
///
/// Every produced vector carries [`EmbeddingsProvider::model_id`], so an index can
/// refuse vectors from a different model.
pub trait EmbeddingsProvider: Send + Sync {
    /// `provider:model` identifier stamped on every vector.
    fn model_id(&self) -> &str;

    /// Async embedding of a single text.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<EmbeddingVector, RagError>>;

    /// Order-preserving batch embedding. Defaults to sequential [`Self::embed`].
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<EmbeddingVector>, RagError>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        })
    }
}

pub mod hash_embedder;
pub mod llm;

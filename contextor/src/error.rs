//! Typed error for the contextor crate.

use ai_llm_service::AiLlmError;
use rag_store::{ErrorKind, RagError};
use telemetry_docs::DocError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (embedding, index, retrieval).
    #[error("RAG error: {0}")]
    Rag(#[from] RagError),

    /// A telemetry record could not be turned into documents.
    #[error("malformed record: {0}")]
    Doc(#[from] DocError),

    /// The generative provider failed after retries.
    #[error("generation unavailable: {0}")]
    Generation(#[source] AiLlmError),

    /// Question rejected before retrieval.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("config error: {0}")]
    Config(String),

    /// JSON (de)serialization issues (should be rare).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContextorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContextorError::Rag(e) => e.kind(),
            ContextorError::Doc(e) => e.kind(),
            ContextorError::Generation(AiLlmError::Config(_)) => ErrorKind::Config,
            ContextorError::Generation(_) => ErrorKind::GenerationUnavailable,
            ContextorError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            ContextorError::Config(_) | ContextorError::Json(_) => ErrorKind::Config,
            ContextorError::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn kinds_pass_through_and_map() {
        let e: ContextorError = RagError::InvalidQuery("k".into()).into();
        assert_eq!(e.kind(), ErrorKind::InvalidQuery);

        let e: ContextorError = DocError::EmptyId.into();
        assert_eq!(e.kind(), ErrorKind::MalformedRecord);

        let e = ContextorError::Generation(AiLlmError::Timeout(Duration::from_secs(2)));
        assert_eq!(e.kind().as_code(), "GENERATION_UNAVAILABLE");
    }
}

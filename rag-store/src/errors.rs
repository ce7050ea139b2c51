//! Unified error types for the crate.

use std::time::Duration;

use ai_llm_service::AiLlmError;
use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
///
/// Callers match on the kind instead of the concrete error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MalformedRecord,
    EmbeddingUnavailable,
    GenerationUnavailable,
    InvalidQuery,
    IndexVersionMismatch,
    IndexUnavailable,
    Config,
    Io,
}

impl ErrorKind {
    /// Stable upper-snake code used in API error bodies.
    pub fn as_code(self) -> &'static str {
        match self {
            ErrorKind::MalformedRecord => "MALFORMED_RECORD",
            ErrorKind::EmbeddingUnavailable => "EMBEDDING_UNAVAILABLE",
            ErrorKind::GenerationUnavailable => "GENERATION_UNAVAILABLE",
            ErrorKind::InvalidQuery => "INVALID_QUERY",
            ErrorKind::IndexVersionMismatch => "INDEX_VERSION_MISMATCH",
            ErrorKind::IndexUnavailable => "INDEX_UNAVAILABLE",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Io => "IO",
        }
    }
}

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Query parameters rejected before touching the index.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Vector length differs from the index space.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Vector produced by a different embedding model than the index holds.
    #[error("embedding model mismatch: got `{got}`, index holds `{want}`")]
    ModelMismatch { got: String, want: String },

    /// Existing collection was created with a different similarity metric.
    #[error("distance mismatch: configured `{got}`, index uses `{want}`")]
    DistanceMismatch { got: String, want: String },

    /// Embedding provider failed after retries.
    #[error("embedding unavailable: {0}")]
    Embedding(#[from] AiLlmError),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// An index call exceeded the per-call timeout.
    #[error("index call `{op}` timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Io(_) => ErrorKind::Io,
            RagError::Parse(_) | RagError::Config(_) => ErrorKind::Config,
            RagError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            RagError::VectorSizeMismatch { .. }
            | RagError::ModelMismatch { .. }
            | RagError::DistanceMismatch { .. } => {
                ErrorKind::IndexVersionMismatch
            }
            RagError::Embedding(AiLlmError::Config(_)) => ErrorKind::Config,
            RagError::Embedding(_) => ErrorKind::EmbeddingUnavailable,
            RagError::Qdrant(_) | RagError::Timeout { .. } => ErrorKind::IndexUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let e = RagError::VectorSizeMismatch { got: 3, want: 4 };
        assert_eq!(e.kind(), ErrorKind::IndexVersionMismatch);
        assert_eq!(e.kind().as_code(), "INDEX_VERSION_MISMATCH");

        let e = RagError::Timeout {
            op: "search",
            after: Duration::from_secs(1),
        };
        assert_eq!(e.kind(), ErrorKind::IndexUnavailable);
        assert_eq!(
            RagError::InvalidQuery("k".into()).kind().as_code(),
            "INVALID_QUERY"
        );
    }
}

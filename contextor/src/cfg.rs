//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rag_store::{DistanceKind, RagConfig, VectorBackend};
use telemetry_docs::DocGranularity;

use crate::error::ContextorError;

/// Which embedder backs the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmbedderKind {
    /// HTTP provider selected by `LLM_KIND`.
    #[default]
    Llm,
    /// Feature-hashing embedder, no network.
    Hash,
}

impl FromStr for EmbedderKind {
    type Err = ContextorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" | "provider" => Ok(EmbedderKind::Llm),
            "hash" | "offline" => Ok(EmbedderKind::Hash),
            other => Err(ContextorError::Config(format!(
                "unsupported embedder `{other}` (expected llm|hash)"
            ))),
        }
    }
}

/// Config bag for the orchestrator. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    // Retrieval knobs
    pub top_k: usize,
    pub min_score: f32,
    pub max_ctx_chars: usize,

    pub granularity: DocGranularity,
    pub audit_log_path: Option<PathBuf>,

    pub backend: VectorBackend,
    pub embedder: EmbedderKind,
    /// Store config (host, collection, distance, batch sizes...).
    pub rag: RagConfig,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.0,
            max_ctx_chars: 4000,
            granularity: DocGranularity::PerRecord,
            audit_log_path: None,
            backend: VectorBackend::Qdrant,
            embedder: EmbedderKind::Llm,
            rag: RagConfig::new_default("http://127.0.0.1:6334", "lemans_data"),
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// Numeric knobs that fail to parse fall back to their default; unknown enum
    /// values (backend, distance, granularity, embedder) are a config error.
    pub fn from_env() -> Result<Self, ContextorError> {
        let dflt = Self::default();

        let mut rag = RagConfig::new_default(
            env("QDRANT_URL", &dflt.rag.qdrant_url),
            env("QDRANT_COLLECTION", &dflt.rag.collection),
        );
        rag.qdrant_api_key = std::env::var("QDRANT_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        rag.distance = env("RAG_DISTANCE", "cosine")
            .parse::<DistanceKind>()
            .map_err(ContextorError::Rag)?;
        rag.embedding_dim = parse("EMBEDDING_DIM", rag.embedding_dim);
        rag.embedding_concurrency = parse("EMBEDDING_CONCURRENCY", rag.embedding_concurrency);
        rag.upsert_batch = parse("QDRANT_BATCH_SIZE", rag.upsert_batch);
        rag.overfetch = parse("RAG_OVERFETCH", rag.overfetch);
        rag.exact_search = env("RAG_EXACT_SEARCH", "false") == "true";
        rag.call_timeout = Duration::from_secs(parse("CALL_TIMEOUT_SECS", 30u64).max(1));
        rag.validate()?;

        let cfg = Self {
            top_k: parse("RAG_TOP_K", dflt.top_k),
            min_score: parse("RAG_MIN_SCORE", dflt.min_score),
            max_ctx_chars: parse("MAX_CTX_CHARS", dflt.max_ctx_chars),
            granularity: env("DOC_GRANULARITY", "record")
                .parse()
                .map_err(ContextorError::Config)?,
            audit_log_path: std::env::var("AUDIT_LOG_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            backend: env("VECTOR_BACKEND", "qdrant").parse()?,
            embedder: env("EMBEDDER", "llm").parse()?,
            rag,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be >= 1".into()));
        }
        if self.max_ctx_chars == 0 {
            return Err(ContextorError::Config("MAX_CTX_CHARS must be >= 1".into()));
        }
        if !self.min_score.is_finite() {
            return Err(ContextorError::Config("RAG_MIN_SCORE must be finite".into()));
        }
        Ok(())
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k).unwrap_or_else(|_| dflt.to_string())
}

fn parse<T: FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ContextorConfig::default();
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.max_ctx_chars, 4000);
        assert_eq!(cfg.rag.overfetch, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let cfg = ContextorConfig {
            top_k: 0,
            ..ContextorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ContextorError::Config(_))));
    }

    #[test]
    fn embedder_kind_parses() {
        assert_eq!("hash".parse::<EmbedderKind>().unwrap(), EmbedderKind::Hash);
        assert_eq!(" LLM ".parse::<EmbedderKind>().unwrap(), EmbedderKind::Llm);
        assert!("gpu".parse::<EmbedderKind>().is_err());
    }
}

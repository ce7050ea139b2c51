//! Runtime and index configuration.

use std::{fmt, str::FromStr, time::Duration};

use serde::Serialize;

use crate::errors::RagError;
use crate::record::EmbeddingVector;

/// Similarity function used for the vector space. Fixed at index creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    /// Cosine similarity (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
}

impl DistanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceKind::Cosine => "cosine",
            DistanceKind::Dot => "dot",
        }
    }

    /// Similarity score, higher is more similar.
    ///
    /// Cosine against a zero vector scores `0.0`.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        match self {
            DistanceKind::Dot => dot,
            DistanceKind::Cosine => {
                let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    0.0
                } else {
                    dot / (na * nb)
                }
            }
        }
    }
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            other => Err(RagError::Config(format!(
                "unsupported distance `{other}` (expected cosine|dot)"
            ))),
        }
    }
}

/// Describes the vector space of an index: dimension, metric and embedding model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexSpace {
    pub size: usize,
    pub distance: DistanceKind,
    /// `provider:model` identifier every stored vector must carry.
    pub model: String,
}

impl IndexSpace {
    pub fn new(size: usize, distance: DistanceKind, model: impl Into<String>) -> Self {
        Self {
            size,
            distance,
            model: model.into(),
        }
    }

    /// Rejects vectors from another model or with another dimension.
    pub fn check(&self, v: &EmbeddingVector) -> Result<(), RagError> {
        if v.model != self.model {
            return Err(RagError::ModelMismatch {
                got: v.model.clone(),
                want: self.model.clone(),
            });
        }
        if v.values.len() != self.size {
            return Err(RagError::VectorSizeMismatch {
                got: v.values.len(),
                want: self.size,
            });
        }
        Ok(())
    }
}

/// Which vector index implementation backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant,
    Memory,
}

impl FromStr for VectorBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(VectorBackend::Qdrant),
            "memory" | "mem" => Ok(VectorBackend::Memory),
            other => Err(RagError::Config(format!(
                "unsupported vector backend `{other}` (expected qdrant|memory)"
            ))),
        }
    }
}

impl fmt::Display for VectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VectorBackend::Qdrant => "qdrant",
            VectorBackend::Memory => "memory",
        })
    }
}

/// Configuration for ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Similarity function (Cosine by default).
    pub distance: DistanceKind,
    /// Expected embedding dimension.
    pub embedding_dim: usize,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Max concurrent embedding calls during ingestion.
    pub embedding_concurrency: usize,
    /// Candidate multiplier applied to `k` before filtering and dedupe.
    pub overfetch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Upper bound for every single index call.
    pub call_timeout: Duration,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            embedding_dim: 384,
            upsert_batch: 256,
            embedding_concurrency: 4,
            overfetch: 3,
            exact_search: false,
            call_timeout: Duration::from_secs(30),
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.embedding_dim == 0 {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.overfetch == 0 {
            return Err(RagError::Config("overfetch must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_distance_and_backend() {
        assert_eq!("Cosine".parse::<DistanceKind>().unwrap(), DistanceKind::Cosine);
        assert_eq!("dot".parse::<DistanceKind>().unwrap(), DistanceKind::Dot);
        assert!("euclid".parse::<DistanceKind>().is_err());
        assert_eq!("memory".parse::<VectorBackend>().unwrap(), VectorBackend::Memory);
    }

    #[test]
    fn cosine_is_scale_invariant() {
        let a = [1.0, 2.0, 0.0];
        let b = [2.0, 4.0, 0.0];
        let s = DistanceKind::Cosine.score(&a, &b);
        assert!((s - 1.0).abs() < 1e-6);
        assert_eq!(DistanceKind::Dot.score(&a, &b), 10.0);
        assert_eq!(DistanceKind::Cosine.score(&a, &[0.0; 3]), 0.0);
    }

    #[test]
    fn space_rejects_foreign_vectors() {
        let space = IndexSpace::new(3, DistanceKind::Cosine, "hash:blake3-3");
        let ok = EmbeddingVector::new(vec![0.0; 3], "hash:blake3-3");
        assert!(space.check(&ok).is_ok());

        let short = EmbeddingVector::new(vec![0.0; 2], "hash:blake3-3");
        assert!(matches!(
            space.check(&short),
            Err(RagError::VectorSizeMismatch { got: 2, want: 3 })
        ));

        let other = EmbeddingVector::new(vec![0.0; 3], "ollama:all-minilm");
        assert!(matches!(space.check(&other), Err(RagError::ModelMismatch { .. })));
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut cfg = RagConfig::new_default("http://localhost:6334", "lemans_data");
        assert!(cfg.validate().is_ok());
        cfg.upsert_batch = 0;
        assert!(cfg.validate().is_err());
    }
}

//! Deterministic feature-hashing embedder. No network.
//!
//! Each lowercase token (letters, digits and inner dots, so `22.0` stays one token)
//! is hashed with BLAKE3 into a bucket; bucket counts are L2-normalized. All weights
//! are non-negative, so cosine scores fall in `[0, 1]`.

use futures::future::BoxFuture;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::record::EmbeddingVector;

#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dim: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self {
            dim,
            model: format!("hash:blake3-{dim}"),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Synchronous embedding, shared by the async trait method.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in tokens(text) {
            let h = blake3::hash(token.as_bytes());
            let mut b = [0u8; 8];
            b.copy_from_slice(&h.as_bytes()[..8]);
            let bucket = (u64::from_le_bytes(b) % self.dim as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.' || c == '_'))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl EmbeddingsProvider for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<EmbeddingVector, RagError>> {
        Box::pin(async move { Ok(EmbeddingVector::new(self.embed_sync(text), self.model.clone())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceKind;

    #[test]
    fn tokens_keep_decimals_and_drop_trailing_dots() {
        let t: Vec<String> = tokens("Front tire at 22.0 PSI. Coolant_temp 87.3.").collect();
        assert_eq!(t, ["front", "tire", "at", "22.0", "psi", "coolant_temp", "87.3"]);
    }

    #[tokio::test]
    async fn deterministic_and_normalized() {
        let e = HashEmbedder::new(64);
        let a = e.embed("coolant temperature 87.3").await.unwrap();
        let b = e.embed("coolant temperature 87.3").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.model, "hash:blake3-64");
        assert_eq!(a.dim(), 64);
        let norm: f32 = a.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn overlapping_text_scores_higher() {
        let e = HashEmbedder::new(256);
        let q = e.embed_sync("front tire pressure");
        let near = e.embed_sync("front tire pressure 22.0 PSI");
        let far = e.embed_sync("driver weight 70.0 kg");
        let s_near = DistanceKind::Cosine.score(&q, &near);
        let s_far = DistanceKind::Cosine.score(&q, &far);
        assert!(s_near > s_far);
        assert!(s_far >= 0.0);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let e = HashEmbedder::new(32);
        let texts = vec!["a b".to_string(), "c d".to_string()];
        let out = e.embed_batch(&texts).await.unwrap();
        assert_eq!(out[0].values, e.embed_sync("a b"));
        assert_eq!(out[1].values, e.embed_sync("c d"));
    }
}

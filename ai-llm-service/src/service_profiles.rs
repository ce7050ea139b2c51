//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Runs every provider call through the configured [`RetryPolicy`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generation = LlmModelConfig {
//!         provider: LlmProvider::Ollama,
//!         model: "llama3.1:8b".into(),
//!         endpoint: "http://localhost:11434".into(),
//!         api_key: None,
//!         max_tokens: Some(512),
//!         temperature: Some(0.2),
//!         top_p: None,
//!         timeout_secs: Some(60),
//!     };
//!     let embedding = LlmModelConfig {
//!         model: "all-minilm".into(),
//!         ..generation.clone()
//!     };
//!
//!     let svc = Arc::new(LlmServiceProfiles::new(generation, embedding, RetryPolicy::default()));
//!     let emb = svc.embed("Tire Pressure Front: 22.0").await?;
//!     println!("Embedding dim = {}", emb.len());
//!     Ok(())
//! }
//! ```

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;
use tracing::trace;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    retry::RetryPolicy,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Shared service that manages the **generation** and **embedding** profiles.
///
/// Internally, it caches Ollama/OpenAI clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,
    retry: RetryPolicy,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service. Clients are built lazily on first use.
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig, retry: RetryPolicy) -> Self {
        Self {
            generation,
            embedding,
            retry,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError::RetriesExhausted`] when every attempt failed transiently,
    /// or the first permanent provider error.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let cfg = &self.generation;
        trace!(model = %cfg.model, "generate");
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                self.retry
                    .run("generate", || cli.generate(prompt, system))
                    .await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                self.retry
                    .run("generate", || cli.generate(prompt, system))
                    .await
            }
        }
    }

    /// Computes embeddings using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = &self.embedding;
        trace!(model = %cfg.model, "embed");
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                self.retry.run("embed", || cli.embeddings(input)).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                self.retry.run("embed", || cli.embeddings(input)).await
            }
        }
    }

    /// `provider:model` of the generation profile.
    pub fn generation_model_id(&self) -> String {
        self.generation.model_id()
    }

    /// `provider:model` of the embedding profile.
    pub fn embedding_model_id(&self) -> String {
        self.embedding.model_id()
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        self.api_key.hash(state);
        self.timeout.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn exposes_model_ids() {
        let svc = LlmServiceProfiles::new(
            ollama("llama3.1:8b"),
            ollama("all-minilm"),
            RetryPolicy::default(),
        );
        assert_eq!(svc.generation_model_id(), "ollama:llama3.1:8b");
        assert_eq!(svc.embedding_model_id(), "ollama:all-minilm");
    }

    #[tokio::test]
    async fn caches_clients_per_config() {
        let svc = LlmServiceProfiles::new(
            ollama("llama3.1:8b"),
            ollama("all-minilm"),
            RetryPolicy::default(),
        );
        let (g, e) = svc.profiles();
        let (g, e) = (g.clone(), e.clone());
        let a = svc.get_or_init_ollama(&g).await.unwrap();
        let b = svc.get_or_init_ollama(&g).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = svc.get_or_init_ollama(&e).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn bad_config_fails_without_retry() {
        let mut bad = ollama("all-minilm");
        bad.endpoint = "not-a-url".into();
        let svc = LlmServiceProfiles::new(ollama("llama3.1:8b"), bad, RetryPolicy::default());
        let err = svc.embed("x").await.unwrap_err();
        assert!(matches!(err, AiLlmError::Provider(_)));
    }
}

//! Generation Client Adapter: prompt → answer text.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::future::BoxFuture;
use tracing::debug;

use crate::error::ContextorError;

/// Generative capability used by the orchestrator.
pub trait AnswerGenerator: Send + Sync {
    /// `"{provider}:{model}"`.
    fn model_id(&self) -> &str;

    fn generate<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>>;
}

/// Generator backed by the shared provider profiles (Ollama or OpenAI).
///
/// Retries and per-call timeouts come from the profiles' retry policy.
pub struct LlmGenerator {
    svc: Arc<LlmServiceProfiles>,
    model: String,
}

impl LlmGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        let model = svc.generation_model_id();
        Self { svc, model }
    }
}

impl AnswerGenerator for LlmGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>> {
        Box::pin(async move {
            let answer = self
                .svc
                .generate(prompt, Some(system))
                .await
                .map_err(ContextorError::Generation)?;
            debug!(model = %self.model, answer_len = answer.len(), "generation done");
            Ok(answer)
        })
    }
}

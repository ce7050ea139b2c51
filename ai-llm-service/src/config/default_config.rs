//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are resolved for the provider named in `LLM_KIND`:
//!
//! - **Generation** → answers engineering questions from grounded context
//! - **Embedding**  → turns telemetry documents and questions into vectors
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`ollama` by default, or `openai`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `EMBEDDING_MODEL` = embedding model (mandatory)
//! - `CALL_TIMEOUT_SECS`, `RETRY_MAX_ATTEMPTS`, `RETRY_BASE_DELAY_MS` = retry policy
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` (mandatory), `OPENAI_URL` (default `https://api.openai.com`)
//! - `OPENAI_MODEL` = generation model (mandatory)

use std::time::Duration;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, validate_http_endpoint,
    },
    retry::RetryPolicy,
};

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            validate_http_endpoint("OLLAMA_URL", url.trim())?;
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{}", port.trim()));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = std::env::var("OPENAI_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://api.openai.com".to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok(url)
}

/// Provider selected by `LLM_KIND` (defaults to Ollama).
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match std::env::var("LLM_KIND") {
        Ok(v) if !v.trim().is_empty() => Ok(v.parse::<LlmProvider>()?),
        _ => Ok(LlmProvider::Ollama),
    }
}

/// Generation profile for the provider named in `LLM_KIND`.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(120)`
pub fn config_generation() -> Result<LlmModelConfig, AiLlmError> {
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let (provider, endpoint, model, api_key) = match provider_from_env()? {
        LlmProvider::Ollama => (
            LlmProvider::Ollama,
            ollama_endpoint()?,
            must_env("OLLAMA_MODEL")?,
            None,
        ),
        LlmProvider::OpenAI => (
            LlmProvider::OpenAI,
            openai_endpoint()?,
            must_env("OPENAI_MODEL")?,
            Some(must_env("OPENAI_API_KEY")?),
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(120),
    })
}

/// Embedding profile for the provider named in `LLM_KIND`.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let model = must_env("EMBEDDING_MODEL")?;
    let (provider, endpoint, api_key) = match provider_from_env()? {
        LlmProvider::Ollama => (LlmProvider::Ollama, ollama_endpoint()?, None),
        LlmProvider::OpenAI => (
            LlmProvider::OpenAI,
            openai_endpoint()?,
            Some(must_env("OPENAI_API_KEY")?),
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}

/// Retry policy from `CALL_TIMEOUT_SECS`, `RETRY_MAX_ATTEMPTS`, `RETRY_BASE_DELAY_MS`.
pub fn retry_policy_from_env() -> Result<RetryPolicy, AiLlmError> {
    let mut policy = RetryPolicy::default();
    if let Some(secs) = env_opt_u64("CALL_TIMEOUT_SECS")? {
        policy.call_timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(n) = env_opt_u32("RETRY_MAX_ATTEMPTS")? {
        policy.max_attempts = n.max(1);
    }
    if let Some(ms) = env_opt_u64("RETRY_BASE_DELAY_MS")? {
        policy.base_delay = Duration::from_millis(ms);
    }
    Ok(policy)
}

//! Shared LLM provider layer for the PES advisor.
//!
//! Wraps the Ollama and OpenAI HTTP APIs behind [`service_profiles::LlmServiceProfiles`],
//! which owns two profiles (generation and embedding), caches HTTP clients per config
//! and runs every call through a [`retry::RetryPolicy`] (timeout + exponential backoff).

pub mod config;
pub mod error_handler;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use retry::RetryPolicy;
pub use service_profiles::LlmServiceProfiles;

use std::{env, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_embedding, config_generation, retry_policy_from_env},
    telemetry,
};
use anyhow::Context;
use colored::Colorize;
use contextor::Contextor;
use tracing::{Level, info, warn};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file when present.
    let dotenv = dotenvy::dotenv();

    init_tracing()?;
    if let Err(e) = dotenv {
        warn!("no .env loaded ({e}); using process environment");
    }

    println!(
        "{} {}",
        "PES advisor".bold().cyan(),
        env!("CARGO_PKG_VERSION").dimmed()
    );

    let svc = Arc::new(LlmServiceProfiles::new(
        config_generation()?,
        config_embedding()?,
        retry_policy_from_env()?,
    ));
    info!(
        generation = %svc.generation_model_id(),
        embedding = %svc.embedding_model_id(),
        "LLM profiles loaded"
    );

    let contextor = Contextor::from_env(svc)?;

    if let Ok(path) = env::var("TELEMETRY_JSONL") {
        let report = contextor
            .ingest_jsonl(&path)
            .await
            .with_context(|| format!("ingesting {path}"))?;
        info!(
            received = report.received,
            upserted = report.upserted,
            skipped = report.skipped.len(),
            "startup ingest done"
        );
    }

    let addr = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());
    println!("{} {}", "listening on".green(), addr.bold());
    api::start(&addr, contextor).await?;

    Ok(())
}

/// `RUST_LOG` (default `info`) for application events; provider events go through
/// the `ai-llm-service` layer with RFC3339 timestamps.
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = telemetry::env_filter_with_level("info", Level::INFO);
    let app_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| {
            !meta.target().starts_with(telemetry::TARGET_PREFIX)
        }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(app_layer)
        .with(telemetry::layer())
        .try_init()
        .context("setting default subscriber failed")?;
    Ok(())
}

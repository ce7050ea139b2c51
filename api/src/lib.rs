//! HTTP surface of the PES advisor.
//!
//! - `POST /ingest`         telemetry rows → ingestion report
//! - `POST /ask`            question → grounded answer, used context and advice
//! - `POST /analyze`        manual setup → PES analysis
//! - `GET  /optimal-ranges` optimal setup window

mod app_state;
mod error_handler;
mod routes;

pub use app_state::AppState;
pub use error_handler::{AppError, AppResult};

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use contextor::Contextor;
use tokio::signal;
use tracing::{info, warn};

use crate::routes::{
    analyze::{analyze_route::analyze, optimal_ranges_route::optimal_ranges},
    ask::ask_question_route::ask_question,
    ingest::ingest_route::ingest,
};

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/ask", post(ask_question))
        .route("/analyze", post(analyze))
        .route("/optimal-ranges", get(optimal_ranges))
        .with_state(state)
}

/// Binds `host_url` and serves until Ctrl+C.
pub async fn start(host_url: &str, contextor: Contextor) -> Result<(), AppError> {
    let app = router(Arc::new(AppState::new(contextor)));

    let listener = tokio::net::TcpListener::bind(host_url)
        .await
        .map_err(AppError::Bind)?;
    info!("listening on {host_url}");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

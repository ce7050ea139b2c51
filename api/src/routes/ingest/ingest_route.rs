//! POST /ingest: telemetry rows → documents → index.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rag_store::IngestReport;
use serde_json::Value;
use tracing::info;

use crate::{app_state::AppState, error_handler::AppResult};

/// Handler: POST /ingest
///
/// Body is a JSON array of telemetry rows. Malformed rows are reported in
/// `skipped`, never rejected as a whole.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ingest \
///   -H 'content-type: application/json' \
///   -d '[{"record_id":"lm24-0001","TirePressure_Front":22.0, "...": "..."}]'
/// ```
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> AppResult<Json<IngestReport>> {
    let Json(rows) = payload?;
    info!(rows = rows.len(), "POST /ingest");
    let report = state.contextor.ingest_rows(&rows).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{row, state};
    use serde_json::json;

    #[tokio::test]
    async fn reports_upserted_and_skipped_rows() {
        let state = state();
        let rows = vec![row("a"), row("b"), json!({"record_id": "c"})];
        let Json(report) = ingest(State(state.clone()), Ok(Json(rows)))
            .await
            .unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.upserted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, "c");
        assert_eq!(state.contextor.store().count().await.unwrap(), 2);
    }
}

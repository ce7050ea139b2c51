//! POST /analyze: PES analysis of a manually entered setup.

use axum::{Json, extract::rejection::JsonRejection};
use telemetry_docs::{PesAnalysis, TelemetryMetrics, analyze as analyze_setup};

use crate::error_handler::AppResult;

/// Handler: POST /analyze
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/analyze \
///   -H 'content-type: application/json' \
///   -d '{"TirePressure_Front":22.0,"TirePressure_Rear":21.8,"TireSize_Front":305,
///        "TireSize_Rear":305,"DriverWeight_kg":70,"CoolantTemperature_C":87.3}'
/// ```
pub async fn analyze(
    payload: Result<Json<TelemetryMetrics>, JsonRejection>,
) -> AppResult<Json<PesAnalysis>> {
    let Json(metrics) = payload?;
    metrics.validate()?;
    Ok(Json(analyze_setup(&metrics)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_pes_and_suggestions() {
        let metrics: TelemetryMetrics = serde_json::from_value(serde_json::json!({
            "TirePressure_Front": 22.0,
            "TirePressure_Rear": 21.8,
            "TireSize_Front": 305,
            "TireSize_Rear": 295,
            "DriverWeight_kg": 74.0,
            "CoolantTemperature_C": 87.3
        }))
        .unwrap();
        let Json(out) = analyze(Ok(Json(metrics))).await.unwrap();
        assert!(out.estimated_pes > 0.0);
        assert_eq!(out.suggestions.len(), 4);
        assert!(out.suggestions[1].contains("too high"));
        assert!(out.suggestions[2].contains("currently 305.0/295.0"));
    }
}

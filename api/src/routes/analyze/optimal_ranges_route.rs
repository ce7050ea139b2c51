//! GET /optimal-ranges

use axum::Json;
use telemetry_docs::{OptimalRanges, optimal_ranges as table};

pub async fn optimal_ranges() -> Json<OptimalRanges> {
    Json(table())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_the_range_table() {
        let Json(ranges) = optimal_ranges().await;
        let v = serde_json::to_value(ranges).unwrap();
        assert_eq!(v["DriverWeight_kg"]["min"], 68.0);
        assert_eq!(v["TireSize_Front"]["recommended"], 305.0);
    }
}

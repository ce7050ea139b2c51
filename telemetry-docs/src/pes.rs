//! Performance Efficiency Score (PES) model.
//!
//! `PES = 1 / (coolant * weight * avg_tire_size) * (1 + avg_pressure / 30)`.
//! Lap time is approximated as `180 - PES * 100000` seconds over the Le Mans circuit
//! (13.626 km).

use serde::Serialize;

use crate::numfmt::fmt_num;
use crate::record::TelemetryMetrics;

/// Le Mans circuit length.
pub const LE_MANS_DISTANCE_KM: f64 = 13.626;
/// Reference PES used for the lap-time delta.
pub const IDEAL_PES: f64 = 0.001;
pub const RECOMMENDED_TIRE_SIZE_MM: f64 = 305.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OptimalRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Recommended {
    pub recommended: f64,
}

/// Optimal setup window, keyed by telemetry column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OptimalRanges {
    #[serde(rename = "CoolantTemperature_C")]
    pub coolant_temperature_c: OptimalRange,
    #[serde(rename = "DriverWeight_kg")]
    pub driver_weight_kg: OptimalRange,
    #[serde(rename = "TireSize_Front")]
    pub tire_size_front: Recommended,
    #[serde(rename = "TireSize_Rear")]
    pub tire_size_rear: Recommended,
    #[serde(rename = "TirePressure_Average")]
    pub tire_pressure_average: OptimalRange,
}

pub const OPTIMAL: OptimalRanges = OptimalRanges {
    coolant_temperature_c: OptimalRange { min: 85.0, max: 95.0 },
    driver_weight_kg: OptimalRange { min: 68.0, max: 72.0 },
    tire_size_front: Recommended {
        recommended: RECOMMENDED_TIRE_SIZE_MM,
    },
    tire_size_rear: Recommended {
        recommended: RECOMMENDED_TIRE_SIZE_MM,
    },
    tire_pressure_average: OptimalRange { min: 21.5, max: 22.5 },
};

pub fn optimal_ranges() -> OptimalRanges {
    OPTIMAL
}

/// Where a value sits relative to its optimal window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeStatus {
    Below,
    Within,
    Above,
}

impl OptimalRange {
    pub fn classify(&self, v: f64) -> RangeStatus {
        if v < self.min {
            RangeStatus::Below
        } else if v > self.max {
            RangeStatus::Above
        } else {
            RangeStatus::Within
        }
    }

    /// `85.0-95.0 °C` style rendering.
    pub fn describe(&self, unit: &str) -> String {
        format!("{}-{}{unit}", fmt_num(self.min), fmt_num(self.max))
    }
}

impl RangeStatus {
    pub fn label(self) -> &'static str {
        match self {
            RangeStatus::Below => "below the optimal range",
            RangeStatus::Within => "within the optimal range",
            RangeStatus::Above => "above the optimal range",
        }
    }
}

/// Returns `0.0` when the denominator is zero or the result is not finite.
pub fn compute_pes(m: &TelemetryMetrics) -> f64 {
    let denom = m.coolant_temperature_c * m.driver_weight_kg * m.avg_tire_size();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let pes = (1.0 / denom) * (1.0 + m.avg_tire_pressure() / 30.0);
    if pes.is_finite() { pes } else { 0.0 }
}

pub fn estimate_lap_time(pes: f64) -> f64 {
    180.0 - pes * 100_000.0
}

/// `None` for a non-positive lap time.
pub fn average_speed_kph(lap_time_s: f64) -> Option<f64> {
    (lap_time_s > 0.0).then(|| LE_MANS_DISTANCE_KM / (lap_time_s / 3600.0))
}

fn range_advice(value: f64, range: &OptimalRange, label: &str, unit: &str) -> String {
    let v = fmt_num(value);
    let window = range.describe(unit);
    match range.classify(value) {
        RangeStatus::Below => format!("{label} is too low ({v}{unit}). Increase to {window}."),
        RangeStatus::Above => format!("{label} is too high ({v}{unit}). Reduce to {window}."),
        RangeStatus::Within => format!("{label} is optimal at {v}{unit} (within {window})."),
    }
}

/// One suggestion per parameter group, in a fixed order:
/// coolant, driver weight, tire size, average tire pressure.
pub fn suggest_adjustments(m: &TelemetryMetrics) -> Vec<String> {
    let mut out = Vec::with_capacity(4);
    out.push(range_advice(
        m.coolant_temperature_c,
        &OPTIMAL.coolant_temperature_c,
        "Coolant Temperature",
        " °C",
    ));
    out.push(range_advice(
        m.driver_weight_kg,
        &OPTIMAL.driver_weight_kg,
        "Driver Weight",
        " kg",
    ));
    if m.tire_size_front != RECOMMENDED_TIRE_SIZE_MM || m.tire_size_rear != RECOMMENDED_TIRE_SIZE_MM {
        out.push(format!(
            "Use 305 mm tire size for both front and rear (currently {}/{}) for optimal PES.",
            fmt_num(m.tire_size_front),
            fmt_num(m.tire_size_rear)
        ));
    } else {
        out.push("Tire sizes are optimal at 305 mm (front and rear).".to_string());
    }
    out.push(range_advice(
        m.avg_tire_pressure(),
        &OPTIMAL.tire_pressure_average,
        "Average Tire Pressure",
        " PSI",
    ));
    out
}

/// Full advice for one setup.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PesAnalysis {
    pub estimated_pes: f64,
    pub lap_time_s: f64,
    pub distance_km: f64,
    pub avg_speed_kph: Option<f64>,
    /// Seconds slower than a car at [`IDEAL_PES`].
    pub lap_time_delta_s: f64,
    pub suggestions: Vec<String>,
}

pub fn analyze(m: &TelemetryMetrics) -> PesAnalysis {
    let pes = compute_pes(m);
    let lap = estimate_lap_time(pes);
    PesAnalysis {
        estimated_pes: pes,
        lap_time_s: lap,
        distance_km: LE_MANS_DISTANCE_KM,
        avg_speed_kph: average_speed_kph(lap),
        lap_time_delta_s: lap - estimate_lap_time(IDEAL_PES),
        suggestions: suggest_adjustments(m),
    }
}

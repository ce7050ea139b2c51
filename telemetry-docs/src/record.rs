//! Telemetry rows as typed records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::errors::DocError;

pub const TIRE_PRESSURE_FRONT: &str = "TirePressure_Front";
pub const TIRE_PRESSURE_REAR: &str = "TirePressure_Rear";
pub const TIRE_SIZE_FRONT: &str = "TireSize_Front";
pub const TIRE_SIZE_REAR: &str = "TireSize_Rear";
pub const DRIVER_WEIGHT: &str = "DriverWeight_kg";
pub const COOLANT_TEMPERATURE: &str = "CoolantTemperature_C";
pub const PES: &str = "PES";
pub const COOLANT_TYPE: &str = "CoolantType";
pub const SESSION_ID: &str = "session_id";
pub const LAP: &str = "lap";

const ID_FIELDS: [&str; 3] = ["record_id", "RecordId", "id"];

/// The six tunable measurements of a car setup. Field names follow the telemetry columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMetrics {
    /// PSI.
    #[serde(rename = "TirePressure_Front")]
    pub tire_pressure_front: f64,
    /// PSI.
    #[serde(rename = "TirePressure_Rear")]
    pub tire_pressure_rear: f64,
    /// mm.
    #[serde(rename = "TireSize_Front")]
    pub tire_size_front: f64,
    /// mm.
    #[serde(rename = "TireSize_Rear")]
    pub tire_size_rear: f64,
    #[serde(rename = "DriverWeight_kg")]
    pub driver_weight_kg: f64,
    #[serde(rename = "CoolantTemperature_C")]
    pub coolant_temperature_c: f64,
}

impl TelemetryMetrics {
    pub fn avg_tire_pressure(&self) -> f64 {
        (self.tire_pressure_front + self.tire_pressure_rear) / 2.0
    }

    pub fn avg_tire_size(&self) -> f64 {
        (self.tire_size_front + self.tire_size_rear) / 2.0
    }

    fn fields(&self) -> [(&'static str, f64); 6] {
        [
            (TIRE_PRESSURE_FRONT, self.tire_pressure_front),
            (TIRE_PRESSURE_REAR, self.tire_pressure_rear),
            (TIRE_SIZE_FRONT, self.tire_size_front),
            (TIRE_SIZE_REAR, self.tire_size_rear),
            (DRIVER_WEIGHT, self.driver_weight_kg),
            (COOLANT_TEMPERATURE, self.coolant_temperature_c),
        ]
    }

    pub fn validate(&self) -> Result<(), DocError> {
        match self.fields().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, _)) => Err(DocError::NonFinite { field }),
            None => Ok(()),
        }
    }

    /// Rebuilds metrics from unit metadata written by the document builder.
    pub fn from_metadata(meta: &BTreeMap<String, Value>) -> Option<Self> {
        let get = |k: &str| meta.get(k).and_then(Value::as_f64);
        Some(Self {
            tire_pressure_front: get(TIRE_PRESSURE_FRONT)?,
            tire_pressure_rear: get(TIRE_PRESSURE_REAR)?,
            tire_size_front: get(TIRE_SIZE_FRONT)?,
            tire_size_rear: get(TIRE_SIZE_REAR)?,
            driver_weight_kg: get(DRIVER_WEIGHT)?,
            coolant_temperature_c: get(COOLANT_TEMPERATURE)?,
        })
    }
}

/// One row of race telemetry. Immutable once ingested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub record_id: String,
    pub session_id: Option<String>,
    pub lap: Option<i64>,
    pub metrics: TelemetryMetrics,
    pub pes: f64,
    pub coolant_type: Option<String>,
}

impl TelemetryRecord {
    /// Parses a raw JSON row.
    ///
    /// The identifier is read from `record_id`, `RecordId` or `id` (string or integer).
    /// Numeric fields accept JSON numbers and numeric strings.
    ///
    /// # Errors
    /// [`DocError`] when the row is not an object, the id is empty, or a required
    /// field is missing, non-numeric or non-finite.
    pub fn from_json(row: &Value) -> Result<Self, DocError> {
        let obj = row.as_object().ok_or(DocError::NotAnObject)?;

        let record_id = ID_FIELDS
            .iter()
            .find_map(|k| obj.get(*k).and_then(scalar_string))
            .filter(|s| !s.trim().is_empty())
            .ok_or(DocError::EmptyId)?;

        let metrics = TelemetryMetrics {
            tire_pressure_front: number(obj, TIRE_PRESSURE_FRONT)?,
            tire_pressure_rear: number(obj, TIRE_PRESSURE_REAR)?,
            tire_size_front: number(obj, TIRE_SIZE_FRONT)?,
            tire_size_rear: number(obj, TIRE_SIZE_REAR)?,
            driver_weight_kg: number(obj, DRIVER_WEIGHT)?,
            coolant_temperature_c: number(obj, COOLANT_TEMPERATURE)?,
        };
        let pes = number(obj, PES)?;

        let lap = match obj.get(LAP) {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                    .ok_or_else(|| DocError::NotNumeric {
                        field: LAP,
                        value: v.to_string(),
                    })?,
            ),
        };

        let record = Self {
            record_id: record_id.trim().to_string(),
            session_id: obj.get(SESSION_ID).and_then(scalar_string),
            lap,
            metrics,
            pes,
            coolant_type: obj
                .get(COOLANT_TYPE)
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        record.validate()?;
        Ok(record)
    }

    /// Identifier, metric and PES checks. Called by the builder for records built in code.
    pub fn validate(&self) -> Result<(), DocError> {
        if self.record_id.trim().is_empty() {
            return Err(DocError::EmptyId);
        }
        self.metrics.validate()?;
        if !self.pes.is_finite() {
            return Err(DocError::NonFinite { field: PES });
        }
        Ok(())
    }

    /// Numeric fields under their telemetry names, plus session, lap and coolant type.
    pub fn metadata(&self) -> BTreeMap<String, Value> {
        let mut m: BTreeMap<String, Value> = self
            .metrics
            .fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        m.insert(PES.into(), json!(self.pes));
        if let Some(s) = &self.session_id {
            m.insert(SESSION_ID.into(), json!(s));
        }
        if let Some(l) = self.lap {
            m.insert(LAP.into(), json!(l));
        }
        if let Some(c) = &self.coolant_type {
            m.insert(COOLANT_TYPE.into(), json!(c));
        }
        m
    }
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, DocError> {
    let v = match obj.get(field) {
        None | Some(Value::Null) => return Err(DocError::MissingField(field)),
        Some(v) => v,
    };
    let x = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| DocError::NotNumeric {
        field,
        value: v.to_string(),
    })?;
    if !x.is_finite() {
        return Err(DocError::NonFinite { field });
    }
    Ok(x)
}

//! Document Builder: telemetry record → natural-language [`DocumentUnit`]s.
//!
//! Each metric group becomes one sentence that quotes the recorded values and a
//! qualitative label against the optimal ranges, so embeddings carry both the
//! numbers and their meaning. Output is deterministic for a given record.

use std::str::FromStr;

use rag_store::{DocumentUnit, SkippedItem};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::errors::DocError;
use crate::numfmt::fmt_num;
use crate::pes::{OPTIMAL, RECOMMENDED_TIRE_SIZE_MM, estimate_lap_time};
use crate::record::TelemetryRecord;

/// How many units one record yields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocGranularity {
    /// One unit per record holding every group (`{id}#0`).
    #[default]
    PerRecord,
    /// One unit per metric group (`{id}#0..#3`: tires, thermal, load, performance).
    PerMetricGroup,
}

impl FromStr for DocGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record" | "per_record" => Ok(DocGranularity::PerRecord),
            "group" | "per_group" | "per_metric_group" => Ok(DocGranularity::PerMetricGroup),
            other => Err(format!("unsupported granularity `{other}` (expected record|group)")),
        }
    }
}

const GROUP_NAMES: [&str; 4] = ["tires", "thermal", "load", "performance"];

/// Most units a single record can yield (one per metric group).
pub const MAX_UNITS_PER_RECORD: usize = GROUP_NAMES.len();

/// Units built from a batch plus the rows that were skipped.
#[derive(Debug, Default)]
pub struct BuildBatch {
    pub units: Vec<DocumentUnit>,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentBuilder {
    granularity: DocGranularity,
}

impl DocumentBuilder {
    pub fn new(granularity: DocGranularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> DocGranularity {
        self.granularity
    }

    /// Renders one record.
    ///
    /// # Errors
    /// [`DocError`] if the record fails validation.
    pub fn build(&self, record: &TelemetryRecord) -> Result<Vec<DocumentUnit>, DocError> {
        record.validate()?;

        let header = header(record);
        let groups = group_sentences(record);
        let metadata = record.metadata();

        let units = match self.granularity {
            DocGranularity::PerRecord => {
                let text = format!("{header} {}", groups.join(" "));
                vec![DocumentUnit::new(&record.record_id, 0, text, metadata)]
            }
            DocGranularity::PerMetricGroup => groups
                .iter()
                .enumerate()
                .map(|(i, sentence)| {
                    let mut meta = metadata.clone();
                    meta.insert("group".into(), json!(GROUP_NAMES[i]));
                    DocumentUnit::new(&record.record_id, i, format!("{header} {sentence}"), meta)
                })
                .collect(),
        };
        Ok(units)
    }

    /// Parses and renders one raw JSON row.
    pub fn build_json(&self, row: &Value) -> Result<Vec<DocumentUnit>, DocError> {
        self.build(&TelemetryRecord::from_json(row)?)
    }

    /// Renders every row it can; malformed rows are skipped with their reason.
    ///
    /// Skipped rows are keyed by their identifier when one is readable, else `row {n}`.
    pub fn build_batch(&self, rows: &[Value]) -> BuildBatch {
        let mut out = BuildBatch::default();
        for (i, row) in rows.iter().enumerate() {
            match self.build_json(row) {
                Ok(units) => out.units.extend(units),
                Err(e) => {
                    let key = row_label(row).unwrap_or_else(|| format!("row {i}"));
                    warn!(%key, error = %e, "skipping malformed telemetry row");
                    out.skipped.push(SkippedItem::new(key, e));
                }
            }
        }
        debug!(
            rows = rows.len(),
            units = out.units.len(),
            skipped = out.skipped.len(),
            "document batch built"
        );
        out
    }
}

fn row_label(row: &Value) -> Option<String> {
    ["record_id", "RecordId", "id"]
        .iter()
        .find_map(|k| match row.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn header(r: &TelemetryRecord) -> String {
    match (&r.session_id, r.lap) {
        (Some(s), Some(l)) => format!("Telemetry record {} (session {s}, lap {l}).", r.record_id),
        (Some(s), None) => format!("Telemetry record {} (session {s}).", r.record_id),
        (None, Some(l)) => format!("Telemetry record {} (lap {l}).", r.record_id),
        (None, None) => format!("Telemetry record {}.", r.record_id),
    }
}

fn group_sentences(r: &TelemetryRecord) -> [String; 4] {
    let m = &r.metrics;

    let pressure = OPTIMAL.tire_pressure_average;
    let size_label = if m.tire_size_front == RECOMMENDED_TIRE_SIZE_MM
        && m.tire_size_rear == RECOMMENDED_TIRE_SIZE_MM
    {
        "matching the recommended 305 mm"
    } else {
        "differing from the recommended 305 mm"
    };
    let tires = format!(
        "Tire pressure front {} PSI and rear {} PSI, average {} PSI is {} ({}). \
         Tire size front {} mm and rear {} mm, {size_label}.",
        fmt_num(m.tire_pressure_front),
        fmt_num(m.tire_pressure_rear),
        fmt_num(m.avg_tire_pressure()),
        pressure.classify(m.avg_tire_pressure()).label(),
        pressure.describe(" PSI"),
        fmt_num(m.tire_size_front),
        fmt_num(m.tire_size_rear),
    );

    let coolant = OPTIMAL.coolant_temperature_c;
    let coolant_type = r
        .coolant_type
        .as_deref()
        .map(|t| format!(" using {t} coolant"))
        .unwrap_or_default();
    let thermal = format!(
        "Coolant temperature {} °C{coolant_type}, {} ({}).",
        fmt_num(m.coolant_temperature_c),
        coolant.classify(m.coolant_temperature_c).label(),
        coolant.describe(" °C"),
    );

    let weight = OPTIMAL.driver_weight_kg;
    let load = format!(
        "Driver weight {} kg, {} ({}).",
        fmt_num(m.driver_weight_kg),
        weight.classify(m.driver_weight_kg).label(),
        weight.describe(" kg"),
    );

    // Lap time is only quoted when the model yields a positive value.
    let lap_time = estimate_lap_time(r.pes);
    let performance = if lap_time > 0.0 {
        format!(
            "Recorded PES {} with an estimated lap time of {lap_time:.2} s.",
            fmt_num(r.pes)
        )
    } else {
        format!("Recorded PES {}.", fmt_num(r.pes))
    };

    [tires, thermal, load, performance]
}

//! Telemetry → documents.
//!
//! - [`TelemetryRecord`]: one validated row of race telemetry
//! - [`DocumentBuilder`]: renders a record into one or more [`rag_store::DocumentUnit`]s
//! - [`pes`]: Performance Efficiency Score math, optimal ranges and tuning advice

pub mod builder;
pub mod errors;
pub mod numfmt;
pub mod pes;
pub mod record;

pub use builder::{BuildBatch, DocGranularity, DocumentBuilder, MAX_UNITS_PER_RECORD};
pub use errors::DocError;
pub use pes::{OptimalRanges, PesAnalysis, analyze, compute_pes, optimal_ranges, suggest_adjustments};
pub use record::{TelemetryMetrics, TelemetryRecord};

//! JSONL row reader for telemetry dumps.
//!
//! This reader is **tolerant**: empty lines are skipped, and lines that are not
//! valid JSON are reported as skipped items instead of failing the whole file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::RagError;
use crate::record::SkippedItem;

/// Parsed rows plus the lines that could not be parsed (`key = "line N"`).
#[derive(Debug, Default)]
pub struct JsonlRows {
    pub rows: Vec<Value>,
    pub bad_lines: Vec<SkippedItem>,
}

/// Reads a JSONL file into raw [`serde_json::Value`] rows.
///
/// # Errors
/// - [`RagError::Io`] if the file cannot be opened or read.
pub fn read_jsonl_rows(jsonl_path: impl AsRef<Path>) -> Result<JsonlRows, RagError> {
    info!("Reading telemetry JSONL: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = JsonlRows::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(v) => out.rows.push(v),
            Err(e) => {
                warn!("Skipping malformed JSON on line {}: {}", i + 1, e);
                out.bad_lines
                    .push(SkippedItem::new(format!("line {}", i + 1), e));
            }
        }
    }

    debug!(
        rows = out.rows.len(),
        bad = out.bad_lines.len(),
        "JSONL loaded"
    );
    Ok(out)
}

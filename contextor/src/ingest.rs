//! Ingestion entry points: raw telemetry rows → documents → index.

use std::collections::BTreeMap;
use std::path::Path;

use rag_store::{DocumentUnit, IngestReport, read_jsonl_rows, unit_key};
use serde_json::Value;
use telemetry_docs::MAX_UNITS_PER_RECORD;
use tracing::{debug, info};

use crate::Contextor;
use crate::error::ContextorError;

impl Contextor {
    /// Builds documents from `rows`, embeds and upserts them.
    ///
    /// Malformed rows and units whose embedding is unavailable are reported in
    /// [`IngestReport::skipped`]; they never abort the batch. Units a re-ingested
    /// record no longer yields (after a granularity change) are deleted.
    ///
    /// # Errors
    /// Model/dimension mismatches and index failures.
    pub async fn ingest_rows(&self, rows: &[Value]) -> Result<IngestReport, ContextorError> {
        let batch = self.builder.build_batch(rows);
        let units_built = batch.units.len();
        let stale = stale_keys(&batch.units);

        let stored = self.store.ingest_units(batch.units).await?;
        if !stale.is_empty() {
            let removed = self.store.index().delete(&stale).await?;
            debug!(removed, "stale units deleted");
        }

        let mut skipped = batch.skipped;
        skipped.extend(stored.skipped);
        let report = IngestReport {
            received: rows.len(),
            units_built,
            upserted: stored.upserted,
            skipped,
        };
        info!(
            received = report.received,
            units = report.units_built,
            upserted = report.upserted,
            skipped = report.skipped.len(),
            "telemetry rows ingested"
        );
        Ok(report)
    }

    /// Reads a JSONL dump and ingests every row. Unparseable lines count as received
    /// and are reported as skipped.
    pub async fn ingest_jsonl(&self, path: impl AsRef<Path>) -> Result<IngestReport, ContextorError> {
        let parsed = read_jsonl_rows(path)?;
        let mut report = self.ingest_rows(&parsed.rows).await?;
        report.received += parsed.bad_lines.len();
        let mut skipped = parsed.bad_lines;
        skipped.append(&mut report.skipped);
        report.skipped = skipped;
        Ok(report)
    }
}

/// Keys `{id}#n` beyond the units each record produced in this batch.
fn stale_keys(units: &[DocumentUnit]) -> Vec<String> {
    let mut per_record: BTreeMap<&str, usize> = BTreeMap::new();
    for u in units {
        *per_record.entry(u.record_id.as_str()).or_default() += 1;
    }
    per_record
        .into_iter()
        .flat_map(|(id, n)| (n..MAX_UNITS_PER_RECORD).map(move |i| unit_key(id, i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_keys_cover_missing_group_indices() {
        let units = vec![
            DocumentUnit::new("a", 0, "a", Default::default()),
            DocumentUnit::new("b", 0, "b0", Default::default()),
            DocumentUnit::new("b", 1, "b1", Default::default()),
            DocumentUnit::new("b", 2, "b2", Default::default()),
            DocumentUnit::new("b", 3, "b3", Default::default()),
        ];
        assert_eq!(stale_keys(&units), ["a#1", "a#2", "a#3"]);
        assert!(stale_keys(&[]).is_empty());
    }
}

//! Ingestion pipeline: embed units with bounded fan-out → upsert into the index in batches.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_units;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{DocumentUnit, SkippedItem};

/// Outcome of one ingestion batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Rows (or units, when called with prebuilt units) handed to the pipeline.
    pub received: usize,
    pub units_built: usize,
    pub upserted: usize,
    pub skipped: Vec<SkippedItem>,
}

/// Embeds and upserts prebuilt units.
///
/// Items whose embedding is unavailable are reported in `skipped`. Model or
/// dimension mismatches and index failures abort with an error.
pub async fn ingest_units(
    cfg: &RagConfig,
    index: &dyn VectorIndex,
    provider: &dyn EmbeddingsProvider,
    units: Vec<DocumentUnit>,
) -> Result<IngestReport, RagError> {
    let space = index.space();
    if provider.model_id() != space.model {
        return Err(RagError::ModelMismatch {
            got: provider.model_id().to_string(),
            want: space.model.clone(),
        });
    }

    let mut report = IngestReport {
        received: units.len(),
        units_built: units.len(),
        ..Default::default()
    };
    if units.is_empty() {
        debug!("No units to ingest");
        return Ok(report);
    }

    let embedded = embed_units(units, provider, cfg.embedding_concurrency).await?;
    report.skipped = embedded.skipped;

    let batch_size = cfg.upsert_batch.max(1);
    let total_chunks = embedded.entries.len().div_ceil(batch_size);
    let pb = ProgressBar::new(total_chunks as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map(|s| s.progress_chars("##-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    let mut entries = embedded.entries;
    while !entries.is_empty() {
        let rest = entries.split_off(batch_size.min(entries.len()));
        let batch = std::mem::replace(&mut entries, rest);
        match index.upsert(batch).await {
            Ok(n) => report.upserted += n,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        upserted = report.upserted,
        skipped = report.skipped.len(),
        "ingestion complete"
    );
    Ok(report)
}

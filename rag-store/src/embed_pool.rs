//! Embedding executor with bounded concurrency.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::embed::EmbeddingsProvider;
use crate::errors::{ErrorKind, RagError};
use crate::record::{DocumentUnit, IndexedEntry, SkippedItem};

/// Units that got a vector, plus those skipped because the provider gave up.
#[derive(Debug, Default)]
pub struct EmbedOutcome {
    pub entries: Vec<IndexedEntry>,
    pub skipped: Vec<SkippedItem>,
}

/// Embeds every unit with at most `concurrency` calls in flight.
///
/// Output keeps input order. A unit whose embedding is unavailable (retries
/// exhausted) is skipped with its reason; any other failure aborts the batch.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if the provider returns a vector of
/// the wrong dimension.
pub async fn embed_units(
    units: Vec<DocumentUnit>,
    provider: &dyn EmbeddingsProvider,
    concurrency: usize,
) -> Result<EmbedOutcome, RagError> {
    info!(
        "embed_pool::embed_units: total={} concurrency={}",
        units.len(),
        concurrency
    );

    if units.is_empty() {
        debug!("embed_pool::embed_units: nothing to embed");
        return Ok(EmbedOutcome::default());
    }

    let mut results = stream::iter(units.into_iter().enumerate())
        .map(|(i, unit)| async move {
            let res = provider.embed(&unit.text).await;
            (i, unit, res)
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    results.sort_by_key(|(i, _, _)| *i);

    let mut out = EmbedOutcome::default();
    for (_, unit, res) in results {
        match res {
            Ok(vector) => out.entries.push(IndexedEntry { vector, unit }),
            Err(e) if e.kind() == ErrorKind::EmbeddingUnavailable => {
                warn!(key = %unit.key, error = %e, "embedding skipped");
                out.skipped.push(SkippedItem::new(unit.key, e));
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        embedded = out.entries.len(),
        skipped = out.skipped.len(),
        "embed_pool::embed_units: done"
    );
    Ok(out)
}

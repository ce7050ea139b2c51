//! Public API types re-used by external crates (e.g., the HTTP API layer).

use chrono::{DateTime, Utc};
use rag_store::MetadataFilter;
use serde::Serialize;
use telemetry_docs::PesAnalysis;

use crate::context::GroundingContext;

/// Per-question overrides. `None` means: use the configured value.
///
/// # Example
/// ```
/// use contextor::AskOptions;
/// let opts = AskOptions { top_k: Some(8), ..AskOptions::default() };
/// assert_eq!(opts.top_k, Some(8));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AskOptions {
    pub top_k: Option<usize>,
    pub min_score: Option<f32>,
    pub filter: Option<MetadataFilter>,
}

/// What was asked, what grounded it, and what came back.
#[derive(Clone, Debug, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    /// Unit keys of the context, in rank order.
    pub context_keys: Vec<String>,
    pub answer: String,
    /// Set to the no-data marker when retrieval produced nothing.
    pub grounding_note: Option<String>,
    /// PES analysis of the top-ranked record.
    pub advice: Option<PesAnalysis>,
    pub timestamp: DateTime<Utc>,
}

/// Final answer together with the exact context passed to the model.
#[derive(Clone, Debug, Serialize)]
pub struct QaAnswer {
    pub record: AnswerRecord,
    pub context: GroundingContext,
}

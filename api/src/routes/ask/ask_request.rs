use chrono::{DateTime, Utc};
use contextor::{ContextEntry, QaAnswer};
use rag_store::MetadataFilter;
use serde::{Deserialize, Serialize};
use telemetry_docs::PesAnalysis;

/// Longest preview returned per context item.
const PREVIEW_CHARS: usize = 800;

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub question: String,
    /// Optional override of the configured `k`.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Optional override of the relevance floor.
    #[serde(default)]
    pub min_score: Option<f32>,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
}

/// Response payload for /ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Final model answer (plain text).
    pub answer: String,
    /// Present when no telemetry supported the answer.
    pub grounding_note: Option<String>,
    /// Context given to the model, in rank order.
    pub context: Vec<CtxItem>,
    pub advice: Option<PesAnalysis>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CtxItem {
    pub key: String,
    pub record_id: String,
    pub rank: usize,
    pub score: f32,
    pub preview: String,
}

impl From<ContextEntry> for CtxItem {
    fn from(e: ContextEntry) -> Self {
        Self {
            key: e.key,
            record_id: e.record_id,
            rank: e.rank,
            score: e.score,
            preview: e.text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

impl From<QaAnswer> for AskResponse {
    fn from(qa: QaAnswer) -> Self {
        let QaAnswer { record, context } = qa;
        Self {
            answer: record.answer,
            grounding_note: record.grounding_note,
            context: context.entries.into_iter().map(CtxItem::from).collect(),
            advice: record.advice,
            timestamp: record.timestamp,
        }
    }
}

//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Retrievable text unit derived from one telemetry record.
///
/// `key` is `"{record_id}#{unit_index}"`, stable across re-ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub key: String,
    pub record_id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl DocumentUnit {
    pub fn new(
        record_id: impl Into<String>,
        unit_index: usize,
        text: impl Into<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Self {
        let record_id = record_id.into();
        Self {
            key: unit_key(&record_id, unit_index),
            record_id,
            text: text.into(),
            metadata,
        }
    }
}

pub fn unit_key(record_id: &str, unit_index: usize) -> String {
    format!("{record_id}#{unit_index}")
}

/// Deterministic UUIDv5 for a unit key, used as the Qdrant point id.
pub fn stable_uuid(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
}

/// Embedding together with the `provider:model` that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub values: Vec<f32>,
    pub model: String,
}

impl EmbeddingVector {
    pub fn new(values: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            values,
            model: model.into(),
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

/// What the index stores under `unit.key`.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedEntry {
    pub vector: EmbeddingVector,
    pub unit: DocumentUnit,
}

impl IndexedEntry {
    pub fn key(&self) -> &str {
        &self.unit.key
    }
}

/// A single scored hit. `rank` starts at 1.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub unit: DocumentUnit,
    pub score: f32,
    pub rank: usize,
}

/// An input that was not indexed, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub key: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(key: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_point_ids_are_stable() {
        let a = DocumentUnit::new("lap-17", 0, "text", BTreeMap::new());
        let b = DocumentUnit::new("lap-17", 0, "other text", BTreeMap::new());
        assert_eq!(a.key, "lap-17#0");
        assert_eq!(stable_uuid(&a.key), stable_uuid(&b.key));
        assert_ne!(stable_uuid("lap-17#0"), stable_uuid("lap-17#1"));
    }
}

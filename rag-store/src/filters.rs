//! Metadata filters: evaluated in-process by `MemoryIndex`, converted to a Qdrant
//! `Filter` by `QdrantIndex`.
//!
//! A filter is a conjunction: every equality and every range must hold.

use std::collections::BTreeMap;

use qdrant_client::qdrant::{Condition, Filter, Range};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Payload prefix under which unit metadata is stored in Qdrant.
pub(crate) const METADATA_FIELD: &str = "metadata";

/// Inclusive numeric range on one metadata field. Missing bounds are open.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NumericRange {
    pub field: String,
    #[serde(default)]
    pub gte: Option<f64>,
    #[serde(default)]
    pub lte: Option<f64>,
}

/// Conjunction of exact matches and numeric ranges on unit metadata.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MetadataFilter {
    #[serde(default)]
    pub equals: Vec<(String, Value)>,
    #[serde(default)]
    pub ranges: Vec<NumericRange>,
}

impl MetadataFilter {
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn range(mut self, field: impl Into<String>, gte: Option<f64>, lte: Option<f64>) -> Self {
        self.ranges.push(NumericRange {
            field: field.into(),
            gte,
            lte,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.ranges.is_empty()
    }

    /// True when every condition holds for `metadata`.
    pub fn matches(&self, metadata: &BTreeMap<String, Value>) -> bool {
        let equals_ok = self.equals.iter().all(|(field, want)| {
            metadata
                .get(field)
                .is_some_and(|got| values_equal(got, want))
        });
        let ranges_ok = self.ranges.iter().all(|r| {
            match metadata.get(&r.field).and_then(Value::as_f64) {
                Some(x) => r.gte.is_none_or(|lo| x >= lo) && r.lte.is_none_or(|hi| x <= hi),
                None => false,
            }
        });
        equals_ok && ranges_ok
    }
}

/// Numbers compare by value so `22` matches `22.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Converts [`MetadataFilter`] to a Qdrant [`Filter`] with `must` semantics.
///
/// - `String` → keyword match
/// - integral `Number` → integer match
/// - fractional `Number` → degenerate range `[x, x]`
/// - `Bool` → boolean match
/// - other JSON values are skipped
pub fn to_qdrant_filter(f: &MetadataFilter) -> Filter {
    debug!(
        equals = f.equals.len(),
        ranges = f.ranges.len(),
        "filters::to_qdrant_filter"
    );

    let mut must: Vec<Condition> = Vec::with_capacity(f.equals.len() + f.ranges.len());

    for (field, val) in &f.equals {
        let key = payload_key(field);
        let cond = match val {
            Value::String(s) => Condition::matches(key, s.clone()),
            Value::Bool(b) => Condition::matches(key, *b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Condition::matches(key, i),
                (None, Some(x)) => Condition::range(
                    key,
                    Range {
                        gte: Some(x),
                        lte: Some(x),
                        ..Default::default()
                    },
                ),
                _ => continue,
            },
            _ => continue,
        };
        must.push(cond);
    }

    for r in &f.ranges {
        must.push(Condition::range(
            payload_key(&r.field),
            Range {
                gte: r.gte,
                lte: r.lte,
                ..Default::default()
            },
        ));
    }

    Filter::must(must)
}

fn payload_key(field: &str) -> String {
    format!("{METADATA_FIELD}.{field}")
}

//! Context assembly: ranked retrieval results → bounded, provenance-tagged context.

use rag_store::RetrievalResult;
use serde::Serialize;
use tracing::debug;

/// One unit of grounding text and where it came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextEntry {
    pub key: String,
    pub record_id: String,
    pub rank: usize,
    pub score: f32,
    pub text: String,
}

/// Ordered context handed to the generator.
///
/// `size` counts characters of unit text. `over_budget` is set only when the first
/// unit alone exceeds `budget` and was kept anyway.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GroundingContext {
    pub entries: Vec<ContextEntry>,
    pub size: usize,
    pub budget: usize,
    pub over_budget: bool,
}

impl GroundingContext {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }
}

/// Appends whole units in rank order until the next one would overflow `max_chars`.
pub fn assemble(results: &[RetrievalResult], max_chars: usize) -> GroundingContext {
    let mut ordered: Vec<&RetrievalResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.rank);

    let mut ctx = GroundingContext {
        budget: max_chars,
        ..GroundingContext::default()
    };

    for r in ordered {
        let len = r.unit.text.chars().count();
        if ctx.size + len > max_chars {
            if ctx.entries.is_empty() {
                ctx.over_budget = true;
                ctx.size = len;
                ctx.entries.push(entry(r));
            }
            break;
        }
        ctx.size += len;
        ctx.entries.push(entry(r));
    }

    debug!(
        entries = ctx.entries.len(),
        size = ctx.size,
        budget = max_chars,
        over_budget = ctx.over_budget,
        "context assembled"
    );
    ctx
}

fn entry(r: &RetrievalResult) -> ContextEntry {
    ContextEntry {
        key: r.unit.key.clone(),
        record_id: r.unit.record_id.clone(),
        rank: r.rank,
        score: r.score,
        text: r.unit.text.clone(),
    }
}

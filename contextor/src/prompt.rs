//! Prompt builder: short system message + labeled telemetry context.

use crate::context::GroundingContext;

/// Placed where the context would go when retrieval found nothing.
pub const NO_DATA_MARKER: &str = "No supporting telemetry data found.";

/// Default system instructions for grounded race-engineering answers.
pub const DEFAULT_SYSTEM: &str = r#"
You are a race engineer analysing Le Mans telemetry. Answer concisely and quote the
telemetry values you rely on, citing record keys in brackets.
Use the provided context as ground truth. If it says no supporting telemetry data was
found, say so plainly and do not invent values.
"#;

/// Builds the user prompt: question first, then either the ranked context or
/// [`NO_DATA_MARKER`].
///
/// # Example
/// ```
/// # use contextor::{GroundingContext, prompt::{build_user_prompt, NO_DATA_MARKER}};
/// let prompt = build_user_prompt("How hot is the coolant?", &GroundingContext::default());
/// assert!(prompt.contains("Question:"));
/// assert!(prompt.contains(NO_DATA_MARKER));
/// ```
pub fn build_user_prompt(question: &str, ctx: &GroundingContext) -> String {
    let mut out = String::new();
    out.push_str("Question:\n");
    out.push_str(question.trim());
    out.push_str("\n\n");

    if ctx.is_empty() {
        out.push_str("Context:\n");
        out.push_str(NO_DATA_MARKER);
        out.push('\n');
        return out;
    }

    out.push_str("Context (top-ranked telemetry):\n");
    for e in &ctx.entries {
        out.push_str(&format!(
            "==[{}]== {} (score {:.3})\n",
            e.rank, e.key, e.score
        ));
        out.push_str(e.text.trim());
        out.push('\n');
    }
    out.push('\n');
    out.push_str("Answer using only the context above.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextEntry;

    #[test]
    fn context_entries_are_labeled_in_order() {
        let ctx = GroundingContext {
            entries: vec![
                ContextEntry {
                    key: "r1#0".into(),
                    record_id: "r1".into(),
                    rank: 1,
                    score: 0.91,
                    text: "Coolant temperature 87.3 °C.".into(),
                },
                ContextEntry {
                    key: "r2#0".into(),
                    record_id: "r2".into(),
                    rank: 2,
                    score: 0.5,
                    text: "Driver weight 70.0 kg.".into(),
                },
            ],
            size: 50,
            budget: 100,
            over_budget: false,
        };
        let p = build_user_prompt("  coolant?  ", &ctx);
        assert!(p.starts_with("Question:\ncoolant?\n"));
        let first = p.find("==[1]== r1#0 (score 0.910)").unwrap();
        let second = p.find("==[2]== r2#0").unwrap();
        assert!(first < second);
        assert!(p.contains("87.3"));
        assert!(!p.contains(NO_DATA_MARKER));
    }
}

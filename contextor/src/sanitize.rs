//! Question sanitizer applied before retrieval.

use regex::Regex;

use crate::error::ContextorError;

pub const MAX_QUESTION_CHARS: usize = 300;

/// Keeps word characters, whitespace and `-.,?`; trims and caps the length.
#[derive(Clone, Debug)]
pub struct QuestionSanitizer {
    disallowed: Regex,
    max_chars: usize,
}

impl QuestionSanitizer {
    pub fn new() -> Result<Self, ContextorError> {
        let disallowed = Regex::new(r"[^\w\s\-.,?]")
            .map_err(|e| ContextorError::Config(format!("question filter: {e}")))?;
        Ok(Self {
            disallowed,
            max_chars: MAX_QUESTION_CHARS,
        })
    }

    pub fn clean(&self, question: &str) -> String {
        let stripped = self.disallowed.replace_all(question, "");
        let capped: String = stripped.trim().chars().take(self.max_chars).collect();
        capped.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        let s = QuestionSanitizer::new().unwrap();
        assert_eq!(
            s.clean("  What's the <b>coolant</b> temp; lap 12?  "),
            "Whats the bcoolantb temp lap 12?"
        );
        assert_eq!(s.clean("front-rear, 22.0 PSI?"), "front-rear, 22.0 PSI?");
    }

    #[test]
    fn caps_length() {
        let s = QuestionSanitizer::new().unwrap();
        let long = "a".repeat(1000);
        assert_eq!(s.clean(&long).chars().count(), MAX_QUESTION_CHARS);
    }

    #[test]
    fn symbol_only_input_becomes_empty() {
        let s = QuestionSanitizer::new().unwrap();
        assert!(s.clean("<>{}[]!@#$%^&*()").is_empty());
    }
}

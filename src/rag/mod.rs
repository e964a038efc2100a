//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! A question is embedded, ranked against the corpus, and the best passages are
//! assembled into a prompt steered by a [`Language`] and an [`Intent`].

mod engine;
mod prompt;
mod quiz;

pub use engine::{Answer, Match, RagEngine};
pub use prompt::PromptAssembler;
pub use quiz::{parse_quiz, QuizItem, QuizOutcome};

use serde::{Deserialize, Serialize};

/// Answer language. Unknown or missing codes fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Mr,
}

impl Language {
    /// Resolve a language code, case-insensitively.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_lowercase()).as_deref() {
            Some("hi") => Language::Hi,
            Some("mr") => Language::Mr,
            _ => Language::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mr => "mr",
        }
    }
}

/// Desired answer style. `Auto` and unknown values behave like `Explain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Auto,
    Explain,
    Code,
    Debug,
    Compare,
}

impl Intent {
    /// Resolve an intent name, case-insensitively.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("explain") => Intent::Explain,
            Some("code") => Intent::Code,
            Some("debug") => Intent::Debug,
            Some("compare") => Intent::Compare,
            _ => Intent::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_fallback() {
        assert_eq!(Language::from_code(Some("HI")), Language::Hi);
        assert_eq!(Language::from_code(Some("mr")), Language::Mr);
        assert_eq!(Language::from_code(Some("xx")), Language::En);
        assert_eq!(Language::from_code(None), Language::En);
    }

    #[test]
    fn test_intent_fallback() {
        assert_eq!(Intent::from_name(Some("Code")), Intent::Code);
        assert_eq!(Intent::from_name(Some("compare")), Intent::Compare);
        assert_eq!(Intent::from_name(Some("unknown")), Intent::Auto);
        assert_eq!(Intent::from_name(None), Intent::Auto);
    }
}

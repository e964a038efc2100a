//! Quiz output parsing.
//!
//! Models asked for JSON do not always comply, so the result is either the
//! parsed items or the raw text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    /// Text of the correct option.
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

/// Result of interpreting the model's quiz output.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    Parsed(Vec<QuizItem>),
    Unparsed(String),
}

impl QuizOutcome {
    pub fn items(&self) -> &[QuizItem] {
        match self {
            QuizOutcome::Parsed(items) => items,
            QuizOutcome::Unparsed(_) => &[],
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            QuizOutcome::Parsed(_) => None,
            QuizOutcome::Unparsed(raw) => Some(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuizPayload {
    List(Vec<QuizItem>),
    Wrapped { questions: Vec<QuizItem> },
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("fence pattern is valid")
    })
}

/// Interpret raw model output as a quiz.
///
/// Accepts a JSON array of items or an object with a `questions` array,
/// optionally wrapped in a Markdown code fence. Anything else, including an
/// empty list, is returned as [`QuizOutcome::Unparsed`] with the trimmed text.
pub fn parse_quiz(raw: &str) -> QuizOutcome {
    let raw = raw.trim();
    let body = code_fence()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());

    match serde_json::from_str::<QuizPayload>(body) {
        Ok(QuizPayload::List(items)) | Ok(QuizPayload::Wrapped { questions: items })
            if !items.is_empty() =>
        {
            QuizOutcome::Parsed(items)
        }
        _ => QuizOutcome::Unparsed(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = r#"{
        "question": "Which property makes a flex container?",
        "options": ["display: flex", "float: left", "position: flex", "flex: container"],
        "answer": "display: flex",
        "explanation": "display: flex establishes a flex formatting context."
    }"#;

    #[test]
    fn test_parses_bare_array() {
        let outcome = parse_quiz(&format!("[{}]", ITEM));
        assert_eq!(outcome.items().len(), 1);
        assert_eq!(outcome.items()[0].answer, "display: flex");
        assert_eq!(outcome.raw(), None);
    }

    #[test]
    fn test_parses_wrapped_object() {
        let outcome = parse_quiz(&format!(r#"{{"questions": [{}, {}]}}"#, ITEM, ITEM));
        assert!(matches!(outcome, QuizOutcome::Parsed(ref items) if items.len() == 2));
    }

    #[test]
    fn test_parses_fenced_json() {
        let outcome = parse_quiz(&format!("```json\n[{}]\n```", ITEM));
        assert_eq!(outcome.items().len(), 1);
    }

    #[test]
    fn test_prose_falls_back_to_raw() {
        let outcome = parse_quiz("  Sure! Here are five questions: ...  ");
        assert_eq!(outcome, QuizOutcome::Unparsed("Sure! Here are five questions: ...".to_string()));
        assert!(outcome.items().is_empty());
    }

    #[test]
    fn test_empty_list_falls_back_to_raw() {
        assert_eq!(parse_quiz("[]"), QuizOutcome::Unparsed("[]".to_string()));
    }

    #[test]
    fn test_wrong_shape_falls_back_to_raw() {
        let outcome = parse_quiz(r#"{"quiz": "none"}"#);
        assert_eq!(outcome.raw(), Some(r#"{"quiz": "none"}"#));
    }

    #[test]
    fn test_missing_explanation_is_allowed() {
        let outcome = parse_quiz(
            r#"[{"question": "q", "options": ["a", "b", "c", "d"], "answer": "a"}]"#,
        );
        assert_eq!(outcome.items()[0].explanation, "");
    }
}

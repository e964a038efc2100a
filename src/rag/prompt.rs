//! Prompt assembly for answers and quizzes.

use super::{Intent, Language};
use crate::config::Prompts;
use crate::corpus::ScoredPassage;
use serde::Serialize;
use std::collections::HashMap;

/// Passage fields exposed to the model.
#[derive(Serialize)]
struct PassageRecord<'a> {
    title: &'a str,
    number: i64,
    start: f64,
    end: f64,
    text: &'a str,
}

/// Builds generation prompts from ranked passages and the user's directives.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    prompts: Prompts,
}

impl PromptAssembler {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    /// Instruction text for the answer language.
    pub fn language_directive(&self, language: Language) -> &str {
        let directives = &self.prompts.language;
        match language {
            Language::En => &directives.en,
            Language::Hi => &directives.hi,
            Language::Mr => &directives.mr,
        }
    }

    /// Instruction text for the quiz wording language.
    pub fn quiz_language_hint(&self, language: Language) -> &str {
        let hints = &self.prompts.quiz_language;
        match language {
            Language::En => &hints.en,
            Language::Hi => &hints.hi,
            Language::Mr => &hints.mr,
        }
    }

    /// Instruction text for the answer style.
    pub fn intent_directive(&self, intent: Intent) -> &str {
        let directives = &self.prompts.intent;
        match intent {
            Intent::Code => &directives.code,
            Intent::Debug => &directives.debug,
            Intent::Compare => &directives.compare,
            Intent::Auto | Intent::Explain => &directives.explain,
        }
    }

    /// The off-topic refusal line, with course variables filled in.
    pub fn refusal(&self) -> String {
        self.prompts
            .render_with_custom(&self.prompts.answer.refusal, &HashMap::new())
    }

    /// Passages serialized as a JSON array of `{title, number, start, end, text}`.
    pub fn context_json(passages: &[ScoredPassage]) -> String {
        let records: Vec<PassageRecord<'_>> = passages
            .iter()
            .map(|p| PassageRecord {
                title: &p.passage.title,
                number: p.passage.number,
                start: p.passage.start,
                end: p.passage.end,
                text: &p.passage.text,
            })
            .collect();
        serde_json::to_string(&records).unwrap_or_default()
    }

    /// Prompt for answering `question` from `passages`.
    pub fn assemble(
        &self,
        question: &str,
        passages: &[ScoredPassage],
        language: Language,
        intent: Intent,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), Self::context_json(passages));
        vars.insert("question".to_string(), question.to_string());
        vars.insert("language".to_string(), self.language_directive(language).to_string());
        vars.insert("intent".to_string(), self.intent_directive(intent).to_string());
        vars.insert("refusal".to_string(), self.refusal());

        self.prompts
            .render_with_custom(&self.prompts.answer.template, &vars)
    }

    /// Prompt asking for `count` multiple-choice questions about `question`.
    pub fn assemble_quiz(
        &self,
        question: &str,
        passages: &[ScoredPassage],
        language: Language,
        count: usize,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), Self::context_json(passages));
        vars.insert("question".to_string(), question.to_string());
        vars.insert("language".to_string(), self.quiz_language_hint(language).to_string());
        vars.insert("count".to_string(), count.to_string());

        self.prompts.render_with_custom(&self.prompts.quiz.template, &vars)
    }
}

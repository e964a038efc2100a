//! Prompt templates for Sigma.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub quiz: QuizPrompts,
    /// Answer-language directives.
    pub language: LanguagePrompts,
    /// Quiz-language hints.
    pub quiz_language: LanguagePrompts,
    pub intent: IntentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            answer: AnswerPrompts::default(),
            quiz: QuizPrompts::default(),
            language: LanguagePrompts::default(),
            quiz_language: LanguagePrompts::quiz_defaults(),
            intent: IntentPrompts::default(),
            variables: HashMap::new(),
        }
    }
}

/// Template used to answer a question from retrieved passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub template: String,
    /// Line the model must emit verbatim for off-topic questions.
    pub refusal: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are an AI teaching assistant for the {{course}}.

You are given some transcript chunks from the course:
Each chunk has: title, video number, start time (seconds), end time (seconds), and text.

Chunks (JSON):
{{context}}

User question: "{{question}}"

Language style:
{{language}}

Intent style (how to answer):
{{intent}}

Your answer MUST:
- Mention the relevant video number(s) and title(s) when possible.
- Mention the relevant timestamp ranges in seconds (start-end) when possible.
- Follow the intent style above (more code, more explanation, debug, or comparison).
- Keep the answer focused on {{domain}} as taught in this course.

If the question is unrelated to {{domain}} or the {{course}}, say in the chosen language:
"{{refusal}}""#
                .to_string(),

            refusal: "I can only answer questions about the {{course}} and {{domain}} topics."
                .to_string(),
        }
    }
}

/// Template used to build a multiple-choice quiz from retrieved passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub template: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are an AI tutor for the {{course}}.

You are given some transcript chunks from the course (JSON):
{{context}}

User question (topic focus): "{{question}}"

Using ONLY the above content, create {{count}} multiple choice questions that test understanding of this topic.

Important instructions:
- {{language}}
- Make questions short and focused ({{domain}} only).
- Each question must have EXACTLY 4 options.
- Only ONE option is correct per question.

Return ONLY valid JSON, no extra text.
Return a JSON array of EXACTLY {{count}} objects.
Each object MUST have this structure:

{
  "question": "string",
  "options": ["option A", "option B", "option C", "option D"],
  "answer": "exact text of the correct option (one of the 4 options)",
  "explanation": "short explanation for why this is correct"
}

Do not wrap the JSON in backticks.
Do not add any other keys."#
                .to_string(),
        }
    }
}

/// One directive per supported language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePrompts {
    pub en: String,
    pub hi: String,
    pub mr: String,
}

impl Default for LanguagePrompts {
    fn default() -> Self {
        Self {
            en: "Answer in clear and simple English for an Indian college student.".to_string(),
            hi: "Answer in simple Hindi (can mix some English like Hinglish), \
                 but main explanation must be in Hindi so an Indian student can understand."
                .to_string(),
            mr: "Answer in simple Marathi (technical words can stay in English), \
                 but main explanation must be in Marathi so a student from Maharashtra can understand."
                .to_string(),
        }
    }
}

impl LanguagePrompts {
    /// Default hints for quiz wording.
    pub fn quiz_defaults() -> Self {
        Self {
            en: "Write the questions and explanations in clear English.".to_string(),
            hi: "Write the questions and explanations in simple Hindi. Options can mix Hindi + English."
                .to_string(),
            mr: "Write the questions and explanations in simple Marathi. Options can mix Marathi + English."
                .to_string(),
        }
    }

    /// Replace only the languages present in `content`.
    fn overlay(&mut self, content: &str) -> crate::error::Result<()> {
        let overrides: LanguageOverrides = toml::from_str(content)?;
        if let Some(en) = overrides.en {
            self.en = en;
        }
        if let Some(hi) = overrides.hi {
            self.hi = hi;
        }
        if let Some(mr) = overrides.mr {
            self.mr = mr;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct LanguageOverrides {
    en: Option<String>,
    hi: Option<String>,
    mr: Option<String>,
}

/// Answer-style directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentPrompts {
    pub explain: String,
    pub code: String,
    pub debug: String,
    pub compare: String,
}

impl Default for IntentPrompts {
    fn default() -> Self {
        Self {
            explain: "Give a conceptual explanation with some examples. \
                      You can include small code snippets if helpful, but explanation is the priority."
                .to_string(),
            code: "Focus mainly on providing clean, well-commented code examples. \
                   Explain briefly, but prioritize showing actual HTML/CSS/JS code that solves the problem."
                .to_string(),
            debug: "Treat this as a debugging request. \
                    Explain what is likely wrong, why it happens, and how to fix it. \
                    If you show code, highlight the corrected version and briefly explain the fix."
                .to_string(),
            compare: "Focus on comparing two or more concepts. \
                      Use bullet points or a table-like style in text, and clearly highlight differences and when to use which."
                .to_string(),
        }
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }

            let language_path = custom_path.join("language.toml");
            if language_path.exists() {
                let content = std::fs::read_to_string(&language_path)?;
                prompts.language = toml::from_str(&content)?;
            }

            let quiz_language_path = custom_path.join("quiz_language.toml");
            if quiz_language_path.exists() {
                let content = std::fs::read_to_string(&quiz_language_path)?;
                prompts.quiz_language.overlay(&content)?;
            }

            let intent_path = custom_path.join("intent.toml");
            if intent_path.exists() {
                let content = std::fs::read_to_string(&intent_path)?;
                prompts.intent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass: placeholders appearing inside inserted
    /// values are left alone, and unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.answer.template.is_empty());
        assert!(prompts.quiz_language.hi.contains("Hindi"));
        assert_ne!(prompts.language.en, prompts.quiz_language.en);
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{ count }} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "what is {{secret}}?".to_string());
        vars.insert("secret".to_string(), "leaked".to_string());

        let result = Prompts::render("Q: {{question}}", &vars);
        assert_eq!(result, "Q: what is {{secret}}?");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let result = Prompts::render("{{missing}} stays", &HashMap::new());
        assert_eq!(result, "{{missing}} stays");
    }

    #[test]
    fn test_custom_dir_overrides_intent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("intent.toml"),
            "code = \"Only show Rust code.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.intent.code, "Only show Rust code.");
        assert_eq!(prompts.intent.debug, IntentPrompts::default().debug);
    }

    #[test]
    fn test_custom_dir_overrides_quiz_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quiz_language.toml"),
            "hi = \"Sirf Hindi mein likho.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.quiz_language.hi, "Sirf Hindi mein likho.");
        assert_eq!(prompts.quiz_language.en, LanguagePrompts::quiz_defaults().en);
        assert_eq!(prompts.language.hi, LanguagePrompts::default().hi);
    }
}

//! Quiz command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{Language, QuizOutcome};
use anyhow::Result;

/// Run the quiz command.
pub async fn run_quiz(question: &str, language: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Writing quiz...");
    let outcome = orchestrator
        .rag()
        .quiz(question, Language::from_code(Some(language)))
        .await;
    spinner.finish_and_clear();

    match outcome {
        Ok(QuizOutcome::Parsed(items)) => {
            Output::header(&format!("Quiz: {}", question.trim()));
            for (i, item) in items.iter().enumerate() {
                Output::quiz_item(i + 1, item);
            }
            println!();
        }
        Ok(QuizOutcome::Unparsed(raw)) => {
            Output::warning("The model did not return a structured quiz; showing its raw output.");
            println!("\n{}\n", raw);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate quiz: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

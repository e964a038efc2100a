//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{Intent, Language};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, language: &str, intent: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let language = Language::from_code(Some(language));
    let intent = Intent::from_name(Some(intent));

    let spinner = Output::spinner("Searching the course...");

    match orchestrator.rag().ask(question, language, intent).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.matches.is_empty() {
                Output::header("Sources");
                for m in &response.matches {
                    Output::passage_result(&m.title, m.number, m.start, m.end, m.score, &m.text);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.rag().search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(passages) => {
            if passages.is_empty() {
                Output::warning("No passages in the corpus yet.");
            } else {
                Output::success(&format!("Found {} results", passages.len()));

                for scored in &passages {
                    let p = &scored.passage;
                    Output::passage_result(&p.title, p.number, p.start, p.end, scored.score, &p.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

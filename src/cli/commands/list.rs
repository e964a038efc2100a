//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::{Corpus, SqliteSnapshot};
use anyhow::Result;

/// Run the list command.
///
/// Only the snapshot is opened; no provider clients are needed.
pub async fn run_list(settings: Settings) -> Result<()> {
    let corpus = Corpus::open(Box::new(SqliteSnapshot::new(&settings.snapshot_path())?))?;
    let videos = corpus.videos();

    if videos.is_empty() {
        Output::info("The corpus is empty. Use 'sigma ingest <file>' or 'sigma import <file.json>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Videos ({})", videos.len()));
    println!();

    for video in &videos {
        Output::video_info(
            &video.title,
            video.number,
            video.source.as_str(),
            video.chunk_count,
            video.duration_seconds,
        );
    }

    println!();
    Output::kv("Total videos", &videos.len().to_string());
    Output::kv("Total passages", &corpus.len().to_string());
    if let Some(dim) = corpus.dimensions() {
        Output::kv("Embedding dimensions", &dim.to_string());
    }

    Ok(())
}

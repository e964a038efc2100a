//! CLI module for Sigma.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sigma - course video assistant
///
/// Answers questions and writes quizzes grounded in course video transcripts,
/// and turns new videos into searchable passages.
#[derive(Parser, Debug)]
#[command(name = "sigma")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a question about the course
    Ask {
        /// The question to ask
        question: String,

        /// Answer language (en, hi, mr)
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Answer style (auto, explain, code, debug, compare)
        #[arg(short, long, default_value = "auto")]
        intent: String,
    },

    /// Generate a multiple-choice quiz on a topic
    Quiz {
        /// Topic to quiz on
        question: String,

        /// Quiz language (en, hi, mr)
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// Search for relevant passages
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Transcribe a video file and add it to the corpus
    Ingest {
        /// Local audio/video file
        file: String,

        /// Title for the passages (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Course video number; without it the video is stored as a user upload
        #[arg(short, long)]
        number: Option<i64>,
    },

    /// Import pre-embedded passages from a JSON file
    Import {
        /// JSON array of passages
        file: String,
    },

    /// List videos in the corpus
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

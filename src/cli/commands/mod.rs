//! CLI command implementations.

mod ask;
mod config;
mod import;
mod ingest;
mod list;
mod quiz;
mod search;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use import::run_import;
pub use ingest::run_ingest;
pub use list::run_list;
pub use quiz::run_quiz;
pub use search::run_search;
pub use serve::run_serve;

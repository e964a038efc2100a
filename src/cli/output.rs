//! CLI output formatting utilities.

use crate::rag::QuizItem;
use crate::transcription::format_timestamp;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one video of the corpus listing.
    pub fn video_info(title: &str, number: i64, source: &str, chunks: usize, duration: f64) {
        println!(
            "  {} {} (#{}, {}, {} chunks, {})",
            style("*").cyan(),
            style(title).bold(),
            number,
            style(source).dim(),
            chunks,
            format_duration(duration)
        );
    }

    /// Print a retrieved passage.
    pub fn passage_result(title: &str, number: i64, start: f64, end: f64, score: f32, text: &str) {
        println!(
            "\n{} {} (video {}) @ {}-{} (score: {:.2})",
            style(">>").green(),
            style(title).bold(),
            number,
            style(format_timestamp(start)).cyan(),
            style(format_timestamp(end)).cyan(),
            score
        );
        println!("   {}", content_preview(text, 200));
    }

    /// Print a numbered quiz question with its options.
    pub fn quiz_item(index: usize, item: &QuizItem) {
        println!("\n{} {}", style(format!("{}.", index)).bold(), item.question);
        for (letter, option) in ('A'..='Z').zip(&item.options) {
            let marker = if *option == item.answer {
                style(letter.to_string()).green().bold()
            } else {
                style(letter.to_string()).dim()
            };
            println!("   {}) {}", marker, option);
        }
        if !item.explanation.is_empty() {
            println!("   {}", style(&item.explanation).dim());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate content with ellipsis, counting characters.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.9), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_content_preview_is_char_safe() {
        assert_eq!(content_preview("नमस्ते दुनिया", 3), "नमस...");
        assert_eq!(content_preview("short\ntext", 200), "short text");
    }
}

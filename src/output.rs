//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! output, progress tracking for bulk moves, and the end-of-run summary
//! table. This module abstracts away output details, making it easy to
//! change formatting globally.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for bulk moves
/// - The end-of-run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar sized to a bulk move.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the end-of-run summary as an aligned two-column table.
    pub fn summary_table(rows: &[(&str, usize)]) {
        Self::header("SUMMARY");

        let label_width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(8);

        for (label, count) in rows {
            let styled = if *count == 0 {
                count.to_string().normal()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, styled, width = label_width);
        }
    }
}

//! Output formatting and styling module.
//!
//! Provides a centralized interface for all terminal output: colored status
//! lines, the progress bar used while a batch runs, and summary tables.

use crate::file_organizer::{MoveOutcome, MoveResult};
use crate::progress::{ProgressReporter, ProgressState};
use crate::scheduler::{BatchReport, BatchState};
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for batches
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// OutputFormatter::success("Organization finished!");
    /// ```
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

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar counting processed files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {percent:>3}% {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// One line describing what happened to a file.
    pub fn move_line(result: &MoveResult) -> String {
        let name = result
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.source.display().to_string());
        let destination = result.destination.display();

        match &result.outcome {
            MoveOutcome::Moved => format!("{} {} → {}", "✓".green(), name, destination),
            MoveOutcome::Simulated => {
                format!("{} {} → {}", "[SIMULATED]".yellow(), name, destination)
            }
            MoveOutcome::AlreadyInPlace => {
                format!("{} {} (already in place)", "=".cyan(), name)
            }
            MoveOutcome::Failed { reason } => format!("{} {}: {}", "✗".red(), name, reason),
        }
    }

    /// Prints a summary table with file counts by destination folder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documentos".to_string(), 15);
    /// counts.insert("Fotos".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_category_len
        );
    }

    /// Prints totals and any failures for a finished batch.
    pub fn batch_summary(report: &BatchReport) {
        Self::summary_table(&report.category_counts(), report.processed() - report.failed());

        if report.already_in_place() > 0 {
            Self::info(&format!(
                "{} {} already in place",
                report.already_in_place(),
                plural(report.already_in_place())
            ));
        }

        if report.failed() > 0 {
            Self::header("FAILED");
            for result in report.failures() {
                Self::error(&Self::move_line(result));
            }
            Self::warning(&format!(
                "{} {} could not be moved and stayed in place",
                report.failed(),
                plural(report.failed())
            ));
        }

        match (report.state, report.dry_run) {
            (BatchState::Cancelled, _) => Self::warning(&format!(
                "Cancelled after {} of {} files",
                report.processed(),
                report.total
            )),
            (_, true) => Self::dry_run_notice("Dry run complete. No files were modified."),
            _ => Self::success("Organization finished!"),
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Renders batch progress on the terminal.
pub struct TerminalReporter {
    bar: ProgressBar,
    list_files: bool,
}

impl TerminalReporter {
    /// `list_files` prints one line per processed file above the bar.
    pub fn new(total: usize, list_files: bool) -> Self {
        Self {
            bar: OutputFormatter::create_progress_bar(total as u64),
            list_files,
        }
    }

    /// A reporter whose bar draws nowhere, for non-interactive runs.
    pub fn hidden(total: usize) -> Self {
        let reporter = Self::new(total, false);
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }
}

impl ProgressReporter for TerminalReporter {
    fn on_progress(&mut self, state: &ProgressState) {
        self.bar.set_position(state.processed as u64);
        self.bar.set_message(state.status());
    }

    fn on_file(&mut self, result: &MoveResult) {
        if self.list_files || !result.succeeded() {
            self.bar.println(OutputFormatter::move_line(result));
        }
    }

    fn on_complete(&mut self, report: &BatchReport) {
        match report.state {
            BatchState::Cancelled => self.bar.abandon_with_message("Cancelled"),
            _ => self.bar.finish_with_message("Organization finished!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use std::path::PathBuf;

    fn result(outcome: MoveOutcome) -> MoveResult {
        MoveResult {
            source: PathBuf::from("/src/photo.jpg"),
            destination: PathBuf::from("/dst/Fotos/photo.jpg"),
            category: Some(Category::Photos),
            outcome,
        }
    }

    #[test]
    fn test_move_line_mentions_file_and_destination() {
        colored::control::set_override(false);

        let line = OutputFormatter::move_line(&result(MoveOutcome::Simulated));
        assert_eq!(line, "[SIMULATED] photo.jpg → /dst/Fotos/photo.jpg");

        let line = OutputFormatter::move_line(&result(MoveOutcome::Failed {
            reason: "permission denied".to_string(),
        }));
        assert_eq!(line, "✗ photo.jpg: permission denied");
    }

    #[test]
    fn test_hidden_reporter_tracks_position() {
        let mut reporter = TerminalReporter::hidden(2);
        let mut state = ProgressState::new(2);
        state.processed = 1;
        state.last_file = Some("photo.jpg".to_string());
        reporter.on_progress(&state);

        assert_eq!(reporter.bar.position(), 1);
        assert_eq!(reporter.bar.message(), "Processing: photo.jpg (1/2)");
    }
}

//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::feedback::FeedbackReport;
use crate::domain::recording::format_clock;

const BAR_WIDTH: usize = 20;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        self.stop_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn is_spinner_active(&self) -> bool {
        self.spinner.is_some()
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.eprint(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.eprint(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.eprint(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.eprint(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Keys understood by the interactive session
    pub fn controls_hint(&self) {
        self.info(&format!(
            "{} start/stop  {} play feedback  {} quit",
            "[Enter]".bold(),
            "[p]".bold(),
            "[q]".bold()
        ));
    }

    /// Start the live recording line
    pub fn recording_started(&mut self, max_secs: u64) {
        let line = self.format_progress(0, max_secs);
        self.start_spinner(&format!("{} {}", "Recording".red().bold(), line));
    }

    /// Refresh the live recording line
    pub fn recording_progress(&self, elapsed_secs: u64, max_secs: u64) {
        let line = self.format_progress(elapsed_secs, max_secs);
        self.update_spinner(&format!("{} {}", "Recording".red().bold(), line));
    }

    /// Format recording progress as `[bar] mm:ss / mm:ss`
    pub fn format_progress(&self, elapsed_secs: u64, max_secs: u64) -> String {
        let percent = if max_secs > 0 {
            (elapsed_secs as f64 / max_secs as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let filled = ((percent / 100.0) * BAR_WIDTH as f64) as usize;
        let empty = BAR_WIDTH - filled;

        format!(
            "[{}{}] {} / {}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            format_clock(elapsed_secs),
            format_clock(max_secs)
        )
    }

    /// Render a report for the terminal
    pub fn format_report(&self, report: &FeedbackReport) -> String {
        let confidence = report.clamped_confidence();
        let filled = ((confidence / 100.0) * BAR_WIDTH as f64).round() as usize;
        let bar = format!(
            "{}{}",
            "█".repeat(filled).green(),
            "░".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
        );

        let mut lines = vec![
            format!("{}", "Presentation feedback".bold().underline()),
            String::new(),
            format!(
                "{} {} [{}]",
                "Confidence:".bold(),
                report.confidence_label(),
                bar
            ),
            String::new(),
            format!("{}", "Areas to improve:".bold()),
        ];

        if report.pronunciation_mistakes.is_empty() {
            lines.push(format!("  {}", "No pronunciation issues found".green()));
        } else {
            lines.extend(
                report
                    .pronunciation_mistakes
                    .iter()
                    .map(|m| format!("  {} {}", "•".yellow(), m)),
            );
        }

        lines.push(String::new());
        lines.push(format!("{}", "Overall feedback:".bold()));
        lines.extend(report.overall_feedback.lines().map(|l| format!("  {}", l)));

        if report.has_audio_feedback() {
            lines.push(String::new());
            lines.push(format!("{} Audio feedback available", "♪".cyan()));
        }

        lines.join("\n")
    }

    /// Print a report to stdout
    pub fn report(&self, report: &FeedbackReport) {
        self.output(&self.format_report(report));
    }

    /// Print an error line without breaking an active spinner
    fn eprint(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use xman_core::output::ProgressUpdate;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg} [{bar:30.cyan/blue}] {percent}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .progress_chars("=> ")
}

/// Progress display for one running script
///
/// Cloning shares the same bar, so output handlers running on reader tasks
/// can update it.
#[derive(Debug, Clone)]
pub struct ScriptProgress {
    pb: ProgressBar,
}

impl ScriptProgress {
    /// Spinner with a status label.
    pub fn spinner(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        Self::start(pb, message)
    }

    /// Bar filled from "N/M" counters.
    pub fn bar(message: &str) -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style());
        Self::start(pb, message)
    }

    fn start(pb: ProgressBar, message: &str) -> Self {
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(style(message).yellow().to_string());
        Self { pb }
    }

    pub fn set_label(&self, label: &str) {
        self.pb.set_message(label.to_string());
    }

    pub fn set_counter(&self, current: u64, total: u64) {
        self.pb.set_length(total);
        self.pb.set_position(current.min(total));
    }

    pub fn apply(&self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::Counter { current, total } => self.set_counter(current, total),
            ProgressUpdate::Label(label) => self.set_label(&label),
        }
    }

    pub fn label(&self) -> String {
        self.pb.message()
    }

    pub fn position(&self) -> (u64, Option<u64>) {
        (self.pb.position(), self.pb.length())
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

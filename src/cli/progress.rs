use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use mistake_clusters::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const EXTRACT_TEMPLATE: &str =
    "  {spinner:.cyan} Extracting [{bar:30.cyan/dim}] {pos}/{len} solutions ({eta} remaining)";
const CLUSTER_TEMPLATE: &str = "  {spinner:.cyan} {msg} [{elapsed}]";

/// Progress bar over extraction, spinner while clustering.
pub struct CliReporter {
    active: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    fn replace(&self, next: Option<ProgressBar>) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if let Some(previous) = std::mem::replace(&mut *active, next) {
            previous.finish_and_clear();
        }
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(active) = self.active.lock() {
            if let Some(bar) = active.as_ref() {
                f(bar);
            }
        }
    }

    fn styled(bar: ProgressBar, template: &str) -> ProgressBar {
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    fn done(message: String) {
        eprintln!("  {} {}", "✓".green(), message);
    }
}

impl ProgressReporter for CliReporter {
    fn on_unify_complete(&self, before: usize, after: usize) {
        Self::done(format!(
            "{} correct solutions unified into {} references",
            before,
            after.to_string().cyan()
        ));
    }

    fn on_extract_start(&self, total: usize) {
        let bar = Self::styled(ProgressBar::new(total as u64), EXTRACT_TEMPLATE);
        self.replace(Some(bar));
    }

    fn on_extract_progress(&self, done: usize, total: usize) {
        self.with_active(|bar| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });
    }

    fn on_extract_complete(&self, extracted: usize, failures: usize, duration_secs: f64) {
        self.replace(None);
        let failed = if failures == 0 {
            "no failures".normal()
        } else {
            format!("{} failed", failures).red()
        };
        Self::done(format!(
            "Extracted changes for {} solutions ({}) in {:.2}s",
            extracted, failed, duration_secs
        ));
    }

    fn on_cluster_start(&self, values: usize) {
        let bar = Self::styled(ProgressBar::new_spinner(), CLUSTER_TEMPLATE);
        bar.set_message(format!("Clustering {} solutions", values));
        self.replace(Some(bar));
    }

    fn on_cluster_complete(&self, clusters: usize, duration_secs: f64) {
        self.replace(None);
        Self::done(format!(
            "Built {} clusters in {:.2}s",
            clusters.to_string().cyan(),
            duration_secs
        ));
    }
}

/// Trait for reporting clustering progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_unify_complete(&self, _before: usize, _after: usize) {}
    fn on_extract_start(&self, _total: usize) {}
    fn on_extract_progress(&self, _done: usize, _total: usize) {}
    fn on_extract_complete(&self, _extracted: usize, _failures: usize, _duration_secs: f64) {}
    fn on_cluster_start(&self, _values: usize) {}
    fn on_cluster_complete(&self, _clusters: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

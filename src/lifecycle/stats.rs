//! Statistics for sweep runs.

use std::path::PathBuf;
use std::time::Duration;

/// Statistics from one sweep invocation.
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    /// Number of candidate units discovered.
    pub scanned_count: usize,

    /// Units deleted, oldest first.
    pub deleted: Vec<PathBuf>,

    /// Group directories removed after becoming empty.
    pub pruned_parents: Vec<PathBuf>,

    /// Deletions that failed and were skipped.
    pub errors: Vec<String>,

    /// Free fraction at evaluation time.
    pub free_before: Option<f64>,

    /// Free fraction when the run finished.
    pub free_after: Option<f64>,

    /// Whether the critical threshold was crossed and a sweep ran.
    pub swept: bool,

    /// Sweep ended below the target free fraction.
    pub insufficient_reclaim: bool,

    /// Time taken for the run.
    pub duration: Duration,
}

impl SweepStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deleted unit and the parent it emptied, if pruned.
    pub fn record_deletion(&mut self, unit: PathBuf, pruned_parent: Option<PathBuf>) {
        self.deleted.push(unit);
        if let Some(parent) = pruned_parent {
            self.pruned_parents.push(parent);
        }
    }

    /// Record an error.
    pub fn record_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Number of units deleted.
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        let free = |f: Option<f64>| match f {
            Some(f) => format!("{:.1}%", f * 100.0),
            None => "n/a".to_string(),
        };
        format!(
            "Scanned: {}, Deleted: {}, Pruned: {}, Errors: {}, Free: {} -> {}, Duration: {:?}",
            self.scanned_count,
            self.deleted.len(),
            self.pruned_parents.len(),
            self.errors.len(),
            free(self.free_before),
            free(self.free_after),
            self.duration
        )
    }
}

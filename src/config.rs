//! Sweep configuration.
//!
//! Thresholds are validated before any filesystem access so that a bad
//! configuration never reaches the eviction loop.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default unit pattern: `<source-id>/<YYYY-MM-DD>/<sequence-number>`.
pub const DEFAULT_UNIT_PATTERN: &str = r"\d+/\d{4}-\d{2}-\d{2}/(?P<key>\d+)$";

const DEFAULT_CRITICAL_FREE_FRACTION: f64 = 0.15;
const DEFAULT_TARGET_FREE_FRACTION: f64 = 0.20;

/// Free-space hysteresis pair.
///
/// A sweep starts below `critical` and stops once free space reaches
/// `target`, so `target` must be strictly greater than `critical`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepThresholds {
    critical: f64,
    target: f64,
}

impl SweepThresholds {
    pub fn new(critical: f64, target: f64) -> Result<Self> {
        for (name, value) in [("critical", critical), ("target", target)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{name} free fraction must be within [0, 1], got {value}"
                )));
            }
        }
        if target <= critical {
            return Err(Error::Config(format!(
                "target free fraction ({target}) must exceed critical free fraction ({critical})"
            )));
        }
        Ok(Self { critical, target })
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

impl Default for SweepThresholds {
    fn default() -> Self {
        Self {
            critical: DEFAULT_CRITICAL_FREE_FRACTION,
            target: DEFAULT_TARGET_FREE_FRACTION,
        }
    }
}

/// What to do when a retention unit cannot be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and surface the error.
    #[default]
    Abort,
    /// Record the failure and move on to the next-oldest unit.
    Skip,
}

impl std::str::FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(Error::Config(format!(
                "unknown deletion failure policy: {other} (expected abort or skip)"
            ))),
        }
    }
}

/// Configuration for one sweeper invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SweepConfig {
    /// Root of all retention units.
    pub working_directory: PathBuf,

    /// Free fraction below which a sweep starts.
    /// Default: 0.15
    #[serde(default = "default_critical")]
    pub critical_free_fraction: f64,

    /// Free fraction at which a sweep stops.
    /// Default: 0.20
    #[serde(default = "default_target")]
    pub target_free_fraction: f64,

    /// Durable log sink. Console output is always on.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Regex matched against each directory's absolute path. A `key` capture
    /// group, if present, supplies the ordering key.
    #[serde(default = "default_unit_pattern")]
    pub unit_pattern: String,

    /// Remove a unit's parent when the deletion leaves it empty.
    /// Default: true
    #[serde(default = "default_true")]
    pub prune_empty_parent: bool,

    /// Default: abort
    #[serde(default)]
    pub on_deletion_failure: FailurePolicy,
}

fn default_critical() -> f64 {
    DEFAULT_CRITICAL_FREE_FRACTION
}

fn default_target() -> f64 {
    DEFAULT_TARGET_FREE_FRACTION
}

fn default_unit_pattern() -> String {
    DEFAULT_UNIT_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

impl SweepConfig {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            critical_free_fraction: DEFAULT_CRITICAL_FREE_FRACTION,
            target_free_fraction: DEFAULT_TARGET_FREE_FRACTION,
            log_file_path: None,
            unit_pattern: default_unit_pattern(),
            prune_empty_parent: true,
            on_deletion_failure: FailurePolicy::Abort,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))
    }

    pub fn thresholds(&self) -> Result<SweepThresholds> {
        SweepThresholds::new(self.critical_free_fraction, self.target_free_fraction)
    }

    /// Check thresholds and the unit pattern. Touches no files.
    pub fn validate(&self) -> Result<()> {
        self.thresholds()?;
        regex::Regex::new(&self.unit_pattern)
            .map_err(|e| Error::Config(format!("invalid unit pattern: {e}")))?;
        Ok(())
    }
}

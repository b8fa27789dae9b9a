//! Structured sweep events and the sinks that receive them.

use std::fmt;
use std::path::PathBuf;

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

/// When a free-space reading was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepEvent {
    RunStarted,
    WorkingDirectory {
        path: PathBuf,
    },
    WorkingDirectoryInvalid {
        path: PathBuf,
        reason: String,
    },
    WalkSkipped {
        path: PathBuf,
        reason: String,
    },
    CandidatesFound {
        count: usize,
    },
    Candidate {
        path: PathBuf,
        key: u64,
    },
    FreeSpace {
        phase: Phase,
        free_fraction: f64,
    },
    Thresholds {
        critical: f64,
        target: f64,
    },
    SweepStarted,
    UnitDeleted {
        path: PathBuf,
        key: u64,
    },
    ParentPruned {
        path: PathBuf,
    },
    DeletionFailed {
        path: PathBuf,
        reason: String,
    },
    InsufficientReclaim {
        free_fraction: f64,
        target: f64,
    },
    SweepFinished {
        deleted: usize,
    },
    RunCompleted,
    RunFailed {
        reason: String,
    },
}

impl SweepEvent {
    pub fn severity(&self) -> Severity {
        match self {
            SweepEvent::WalkSkipped { .. } | SweepEvent::InsufficientReclaim { .. } => {
                Severity::Warning
            }
            SweepEvent::WorkingDirectoryInvalid { .. }
            | SweepEvent::DeletionFailed { .. }
            | SweepEvent::RunFailed { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

impl fmt::Display for SweepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepEvent::RunStarted => write!(f, "sweeper started"),
            SweepEvent::WorkingDirectory { path } => {
                write!(f, "working directory: {}", path.display())
            }
            SweepEvent::WorkingDirectoryInvalid { path, reason } => write!(
                f,
                "working directory {} unusable ({reason}), stopping",
                path.display()
            ),
            SweepEvent::WalkSkipped { path, reason } => {
                write!(f, "skipped unreadable directory {}: {reason}", path.display())
            }
            SweepEvent::CandidatesFound { count } => {
                write!(f, "found {count} recording directories")
            }
            SweepEvent::Candidate { path, key } => {
                write!(f, "candidate {key}: {}", path.display())
            }
            SweepEvent::FreeSpace {
                phase,
                free_fraction,
            } => {
                let when = match phase {
                    Phase::Before => "before sweep",
                    Phase::After => "after sweep",
                };
                write!(f, "free space {when}: {}", percent(*free_fraction))
            }
            SweepEvent::Thresholds { critical, target } => write!(
                f,
                "free space thresholds: critical {} target {}",
                percent(*critical),
                percent(*target)
            ),
            SweepEvent::SweepStarted => write!(f, "sweep started"),
            SweepEvent::UnitDeleted { path, .. } => {
                write!(f, "deleted recording directory: {}", path.display())
            }
            SweepEvent::ParentPruned { path } => {
                write!(f, "deleted empty parent directory: {}", path.display())
            }
            SweepEvent::DeletionFailed { path, reason } => {
                write!(f, "failed to delete {}: {reason}", path.display())
            }
            SweepEvent::InsufficientReclaim {
                free_fraction,
                target,
            } => write!(
                f,
                "sweep finished at {} free, below target {}; space is likely held by something else",
                percent(*free_fraction),
                percent(*target)
            ),
            SweepEvent::SweepFinished { deleted } => {
                write!(f, "sweep finished, {deleted} directories deleted")
            }
            SweepEvent::RunCompleted => write!(f, "sweeper finished"),
            SweepEvent::RunFailed { reason } => write!(f, "sweeper failed: {reason}"),
        }
    }
}

/// Receiver of sweep events.
pub trait Reporter {
    fn emit(&mut self, event: SweepEvent);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn emit(&mut self, event: SweepEvent) {
        (**self).emit(event);
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&mut self, event: SweepEvent) {
        let level = match event {
            // Per-candidate listing is noise at info level during a sweep.
            SweepEvent::Candidate { .. } => log::Level::Debug,
            _ => event.severity().level(),
        };
        log::log!(target: "sweeper", level, "{event}");
    }
}

/// Keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    events: Vec<SweepEvent>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SweepEvent] {
        &self.events
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events
            .iter()
            .filter(|e| e.severity() == severity)
            .count()
    }

    /// Paths of deleted units, in deletion order.
    pub fn deleted_paths(&self) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SweepEvent::UnitDeleted { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_insufficient_reclaim(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, SweepEvent::InsufficientReclaim { .. }))
    }
}

impl Reporter for MemoryReporter {
    fn emit(&mut self, event: SweepEvent) {
        self.events.push(event);
    }
}

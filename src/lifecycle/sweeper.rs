//! Retention sweeper: one invocation from working-directory check to report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{FailurePolicy, SweepConfig, SweepThresholds};
use crate::lifecycle::{
    locate_candidates, CandidateList, FsDeleter, PatternMatcher, SweepEngine, SweepStats,
    UnitDeleter, UnitMatcher,
};
use crate::report::{LogReporter, Reporter, SweepEvent};
use crate::volume::{StatVfsProbe, VolumeProbe, VolumeState};
use crate::{Error, Result};

/// Candidates and volume usage, without deleting anything.
#[derive(Debug, Clone)]
pub struct CandidateReport {
    pub root: PathBuf,
    pub candidates: CandidateList,
    pub volume: VolumeState,
}

pub struct Sweeper<P = StatVfsProbe, D = FsDeleter, R = LogReporter> {
    /// Absolute working directory.
    root: PathBuf,
    thresholds: SweepThresholds,
    on_failure: FailurePolicy,
    matcher: Box<dyn UnitMatcher>,
    probe: P,
    deleter: D,
    reporter: R,
}

impl Sweeper {
    /// Sweeper over the real filesystem, reporting through `log`.
    pub fn new(config: &SweepConfig) -> Result<Self> {
        Self::with_probe(config, StatVfsProbe, LogReporter)
    }
}

impl<P: VolumeProbe, R: Reporter> Sweeper<P, FsDeleter, R> {
    pub fn with_probe(config: &SweepConfig, probe: P, reporter: R) -> Result<Self> {
        let root = resolve_root(&config.working_directory)?;
        let deleter = FsDeleter::new(&root, config.prune_empty_parent);
        Self::with_parts(config, probe, deleter, reporter)
    }
}

impl<P: VolumeProbe, D: UnitDeleter, R: Reporter> Sweeper<P, D, R> {
    /// Validates the configuration. Does not touch the filesystem.
    pub fn with_parts(config: &SweepConfig, probe: P, deleter: D, reporter: R) -> Result<Self> {
        config.validate()?;
        let thresholds = config.thresholds()?;
        let matcher = PatternMatcher::new(&config.unit_pattern)?;

        Ok(Self {
            root: resolve_root(&config.working_directory)?,
            thresholds,
            on_failure: config.on_deletion_failure,
            matcher: Box::new(matcher),
            probe,
            deleter,
            reporter,
        })
    }

    /// Replace the ordering-key strategy.
    pub fn with_matcher(mut self, matcher: impl UnitMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run one sweep.
    ///
    /// A missing working directory fails before any probe or deletion.
    /// Failures are reported as events before being returned.
    pub fn run_once(&mut self) -> Result<SweepStats> {
        let start = Instant::now();
        self.reporter.emit(SweepEvent::RunStarted);

        let result = self.run_inner();
        match &result {
            Ok(_) => self.reporter.emit(SweepEvent::RunCompleted),
            // Already reported when the check failed.
            Err(Error::WorkingDirectory { .. }) => {}
            Err(err) => self.reporter.emit(SweepEvent::RunFailed {
                reason: err.to_string(),
            }),
        }

        result.map(|mut stats| {
            stats.duration = start.elapsed();
            stats
        })
    }

    fn run_inner(&mut self) -> Result<SweepStats> {
        self.check_working_directory()?;

        let mut stats = SweepStats::new();
        let candidates = self.discover()?;
        stats.scanned_count = candidates.len();

        let mut engine = SweepEngine::new(&self.root, self.thresholds, self.on_failure);
        engine.run(
            candidates,
            &mut self.probe,
            &mut self.deleter,
            &mut self.reporter,
            &mut stats,
        )?;

        Ok(stats)
    }

    /// Discover candidates and read volume usage. Deletes nothing.
    pub fn list(&mut self) -> Result<CandidateReport> {
        self.check_working_directory()?;
        let candidates = self.discover()?;
        let volume = self.probe.state(&self.root)?;
        Ok(CandidateReport {
            root: self.root.clone(),
            candidates,
            volume,
        })
    }

    fn discover(&mut self) -> Result<CandidateList> {
        let candidates = locate_candidates(&self.root, &*self.matcher, &mut self.reporter)?;
        self.reporter.emit(SweepEvent::CandidatesFound {
            count: candidates.len(),
        });
        for unit in candidates.newest_first() {
            self.reporter.emit(SweepEvent::Candidate {
                path: unit.path.clone(),
                key: unit.key,
            });
        }
        Ok(candidates)
    }

    fn check_working_directory(&mut self) -> Result<()> {
        self.reporter.emit(SweepEvent::WorkingDirectory {
            path: self.root.clone(),
        });

        let reason = if !self.root.exists() {
            "not found"
        } else if !self.root.is_dir() {
            "not a directory"
        } else {
            return Ok(());
        };

        self.reporter.emit(SweepEvent::WorkingDirectoryInvalid {
            path: self.root.clone(),
            reason: reason.to_string(),
        });
        Err(Error::WorkingDirectory {
            path: self.root.clone(),
            reason: reason.to_string(),
        })
    }
}

fn resolve_root(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::WorkingDirectory {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

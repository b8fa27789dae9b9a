//! Eviction policy engine.
//!
//! Drives one sweep through `Idle -> Evaluating -> Sweeping -> Done`. Free
//! space is re-probed before every decision; the engine never trusts an
//! earlier reading once a deletion has happened.

use std::path::Path;

use crate::config::{FailurePolicy, SweepThresholds};
use crate::lifecycle::{
    should_start_sweep, target_reached, CandidateList, SweepStats, UnitDeleter,
};
use crate::report::{Phase, Reporter, SweepEvent};
use crate::volume::VolumeProbe;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Evaluating,
    Sweeping,
    Done,
}

pub struct SweepEngine<'a> {
    root: &'a Path,
    thresholds: SweepThresholds,
    on_failure: FailurePolicy,
    state: SweepState,
}

impl<'a> SweepEngine<'a> {
    /// `root` is the path handed to the probe.
    pub fn new(root: &'a Path, thresholds: SweepThresholds, on_failure: FailurePolicy) -> Self {
        Self {
            root,
            thresholds,
            on_failure,
            state: SweepState::Idle,
        }
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Run the sweep once. The engine ends in `Done` whether or not this
    /// returns an error.
    pub fn run(
        &mut self,
        candidates: CandidateList,
        probe: &mut dyn VolumeProbe,
        deleter: &mut dyn UnitDeleter,
        reporter: &mut dyn Reporter,
        stats: &mut SweepStats,
    ) -> Result<()> {
        let result = self.evaluate_and_sweep(candidates, probe, deleter, reporter, stats);
        self.state = SweepState::Done;
        result
    }

    fn evaluate_and_sweep(
        &mut self,
        mut candidates: CandidateList,
        probe: &mut dyn VolumeProbe,
        deleter: &mut dyn UnitDeleter,
        reporter: &mut dyn Reporter,
        stats: &mut SweepStats,
    ) -> Result<()> {
        self.state = SweepState::Evaluating;
        let free = probe.free_fraction(self.root)?;
        stats.free_before = Some(free);
        reporter.emit(SweepEvent::FreeSpace {
            phase: Phase::Before,
            free_fraction: free,
        });
        reporter.emit(SweepEvent::Thresholds {
            critical: self.thresholds.critical(),
            target: self.thresholds.target(),
        });

        if should_start_sweep(free, &self.thresholds) {
            self.state = SweepState::Sweeping;
            stats.swept = true;
            reporter.emit(SweepEvent::SweepStarted);
            self.sweep(&mut candidates, probe, deleter, reporter, stats)?;
        }

        let free_after = probe.free_fraction(self.root)?;
        stats.free_after = Some(free_after);

        if stats.swept {
            if !target_reached(free_after, &self.thresholds) {
                stats.insufficient_reclaim = true;
                reporter.emit(SweepEvent::InsufficientReclaim {
                    free_fraction: free_after,
                    target: self.thresholds.target(),
                });
            }
            reporter.emit(SweepEvent::SweepFinished {
                deleted: stats.deleted_count(),
            });
        }

        reporter.emit(SweepEvent::FreeSpace {
            phase: Phase::After,
            free_fraction: free_after,
        });
        Ok(())
    }

    /// Delete oldest-first until the target is reached or candidates run out.
    fn sweep(
        &mut self,
        candidates: &mut CandidateList,
        probe: &mut dyn VolumeProbe,
        deleter: &mut dyn UnitDeleter,
        reporter: &mut dyn Reporter,
        stats: &mut SweepStats,
    ) -> Result<()> {
        while !candidates.is_empty() {
            let free = probe.free_fraction(self.root)?;
            if target_reached(free, &self.thresholds) {
                break;
            }

            let Some(unit) = candidates.pop_oldest() else {
                break;
            };

            match deleter.delete_unit(&unit) {
                Ok(outcome) => {
                    reporter.emit(SweepEvent::UnitDeleted {
                        path: outcome.unit.path.clone(),
                        key: outcome.unit.key,
                    });
                    if let Some(parent) = &outcome.pruned_parent {
                        reporter.emit(SweepEvent::ParentPruned {
                            path: parent.clone(),
                        });
                    }
                    stats.record_deletion(outcome.unit.path.clone(), outcome.pruned_parent);
                    // Unit already removed; only the parent prune failed.
                    if let Some(err) = outcome.prune_error {
                        let unit_path = outcome.unit.path.as_path();
                        let parent = outcome.unit.group().unwrap_or(unit_path);
                        self.deletion_failed(parent, err, reporter, stats)?;
                    }
                }
                Err(err) => self.deletion_failed(&unit.path, err, reporter, stats)?,
            }
        }
        Ok(())
    }

    /// Report a failed removal and apply the failure policy.
    fn deletion_failed(
        &self,
        path: &Path,
        err: Error,
        reporter: &mut dyn Reporter,
        stats: &mut SweepStats,
    ) -> Result<()> {
        reporter.emit(SweepEvent::DeletionFailed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        });
        match self.on_failure {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Skip => {
                stats.record_error(err.to_string());
                Ok(())
            }
        }
    }
}

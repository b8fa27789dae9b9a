//! Retention lifecycle: discovery, eviction policy and deletion.
//!
//! # Overview
//!
//! Each invocation re-discovers retention units under the working directory,
//! probes free space and, when it is below the critical threshold, deletes
//! units oldest-first until the target threshold is reached or no candidates
//! remain. Nothing is carried over between invocations; the filesystem is the
//! only state.
//!
//! # Example
//!
//! ```rust,no_run
//! use sweeper::config::SweepConfig;
//! use sweeper::lifecycle::Sweeper;
//!
//! let mut config = SweepConfig::new("/srv/video");
//! config.critical_free_fraction = 0.15;
//! config.target_free_fraction = 0.20;
//!
//! let mut sweeper = Sweeper::new(&config)?;
//! let stats = sweeper.run_once()?;
//! println!("{}", stats.summary());
//! # Ok::<(), sweeper::Error>(())
//! ```

mod deleter;
mod engine;
mod locator;
mod policy;
mod stats;
mod sweeper;
mod unit;

pub use deleter::{DeletionOutcome, FsDeleter, UnitDeleter};
pub use engine::{SweepEngine, SweepState};
pub use locator::{locate_candidates, CandidateList, PatternMatcher, UnitMatcher};
pub use policy::{should_start_sweep, target_reached};
pub use stats::SweepStats;
pub use sweeper::{CandidateReport, Sweeper};
pub use unit::RetentionUnit;

//! Disk-space-bounded retention sweeper.
//!
//! Monitors free space on the volume holding sequentially produced recording
//! directories and, when it drops below a critical threshold, evicts the
//! oldest recordings until a target headroom is restored.

pub mod config;
pub mod error;
pub mod lifecycle;
#[cfg(feature = "cli")]
pub mod logging;
pub mod report;
pub mod volume;

pub use config::{FailurePolicy, SweepConfig, SweepThresholds};
pub use error::{Error, Result};
pub use lifecycle::{SweepStats, Sweeper};

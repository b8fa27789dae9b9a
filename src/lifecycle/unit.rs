//! Retention unit descriptor.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// One recording session directory, the atomic deletion granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionUnit {
    /// Absolute path to the unit directory.
    pub path: PathBuf,

    /// Ordering key. Higher keys are more recent.
    pub key: u64,
}

impl RetentionUnit {
    pub fn new(path: impl Into<PathBuf>, key: u64) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// The group directory holding this unit (e.g. the date directory).
    pub fn group(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl Ord for RetentionUnit {
    /// Key first, path as a deterministic tie-break.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for RetentionUnit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_key_then_path() {
        let a = RetentionUnit::new("/v/2/2024-01-01/5", 5);
        let b = RetentionUnit::new("/v/1/2024-01-01/5", 5);
        let c = RetentionUnit::new("/v/1/2024-01-01/3", 3);

        let mut units = vec![a.clone(), b.clone(), c.clone()];
        units.sort();
        assert_eq!(units, vec![c, b, a]);
    }

    #[test]
    fn group_is_parent() {
        let unit = RetentionUnit::new("/v/1/2024-01-01/5", 5);
        assert_eq!(unit.group(), Some(Path::new("/v/1/2024-01-01")));
    }
}

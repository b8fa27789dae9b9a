//! Retention unit removal with one-level empty-parent pruning.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::lifecycle::RetentionUnit;
use crate::{Error, Result};

/// Result of deleting one unit.
///
/// Returned whenever the unit itself is gone, even if pruning its parent
/// then failed.
#[derive(Debug)]
pub struct DeletionOutcome {
    pub unit: RetentionUnit,

    /// The group directory, if it was left empty and removed.
    pub pruned_parent: Option<PathBuf>,

    /// Pruning the emptied parent failed after the unit was removed.
    pub prune_error: Option<Error>,
}

impl DeletionOutcome {
    pub fn new(unit: RetentionUnit) -> Self {
        Self {
            unit,
            pruned_parent: None,
            prune_error: None,
        }
    }
}

pub trait UnitDeleter {
    fn delete_unit(&mut self, unit: &RetentionUnit) -> Result<DeletionOutcome>;
}

impl<D: UnitDeleter + ?Sized> UnitDeleter for &mut D {
    fn delete_unit(&mut self, unit: &RetentionUnit) -> Result<DeletionOutcome> {
        (**self).delete_unit(unit)
    }
}

/// Permanent on-disk deletion.
#[derive(Debug, Clone)]
pub struct FsDeleter {
    root: PathBuf,
    prune_empty_parent: bool,
}

impl FsDeleter {
    /// `root` bounds pruning: it is never removed, nor is anything above it.
    pub fn new(root: impl Into<PathBuf>, prune_empty_parent: bool) -> Self {
        Self {
            root: root.into(),
            prune_empty_parent,
        }
    }

    fn prune_parent(&self, unit: &Path) -> Result<Option<PathBuf>> {
        let Some(parent) = unit.parent() else {
            return Ok(None);
        };
        if !parent.starts_with(&self.root) || parent == self.root.as_path() {
            return Ok(None);
        }
        if !is_empty_dir(parent).map_err(|source| deletion_error(parent, source))? {
            return Ok(None);
        }
        fs::remove_dir(parent).map_err(|source| deletion_error(parent, source))?;
        Ok(Some(parent.to_path_buf()))
    }
}

impl UnitDeleter for FsDeleter {
    fn delete_unit(&mut self, unit: &RetentionUnit) -> Result<DeletionOutcome> {
        fs::remove_dir_all(&unit.path).map_err(|source| deletion_error(&unit.path, source))?;

        let mut outcome = DeletionOutcome::new(unit.clone());
        if self.prune_empty_parent {
            match self.prune_parent(&unit.path) {
                Ok(parent) => outcome.pruned_parent = parent,
                Err(err) => outcome.prune_error = Some(err),
            }
        }
        Ok(outcome)
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

fn deletion_error(path: &Path, source: io::Error) -> Error {
    Error::Deletion {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(root: &Path, rel: &str, key: u64) -> RetentionUnit {
        let path = root.join(rel);
        fs::create_dir_all(&path).expect("create unit");
        fs::write(path.join("chunk.mp4"), b"video").expect("write chunk");
        RetentionUnit::new(path, key)
    }

    #[test]
    fn last_unit_prunes_parent() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        let victim = unit(root, "1/2024-01-01/7", 7);

        let mut deleter = FsDeleter::new(root, true);
        let outcome = deleter.delete_unit(&victim).expect("delete");

        assert!(!victim.path.exists());
        assert_eq!(outcome.pruned_parent, Some(root.join("1/2024-01-01")));
        assert!(outcome.prune_error.is_none());
        assert!(!root.join("1/2024-01-01").exists());
        // Pruning stops one level up.
        assert!(root.join("1").exists());
    }

    #[test]
    fn sibling_keeps_parent() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        let victim = unit(root, "1/2024-01-01/7", 7);
        let sibling = unit(root, "1/2024-01-01/8", 8);

        let mut deleter = FsDeleter::new(root, true);
        let outcome = deleter.delete_unit(&victim).expect("delete");

        assert!(!victim.path.exists());
        assert!(sibling.path.exists());
        assert_eq!(outcome.pruned_parent, None);
    }

    #[test]
    fn pruning_disabled_keeps_empty_parent() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        let victim = unit(root, "1/2024-01-01/7", 7);

        let mut deleter = FsDeleter::new(root, false);
        let outcome = deleter.delete_unit(&victim).expect("delete");

        assert_eq!(outcome.pruned_parent, None);
        assert!(root.join("1/2024-01-01").exists());
    }

    #[test]
    fn never_prunes_root() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("video");
        let victim = unit(&root, "5", 5);

        let mut deleter = FsDeleter::new(&root, true);
        let outcome = deleter.delete_unit(&victim).expect("delete");

        assert_eq!(outcome.pruned_parent, None);
        assert!(root.exists());
    }

    #[test]
    fn empty_unit_still_prunes_parent() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        let path = root.join("1/2024-01-01/3");
        fs::create_dir_all(&path).expect("create");

        let mut deleter = FsDeleter::new(root, true);
        let outcome = deleter
            .delete_unit(&RetentionUnit::new(&path, 3))
            .expect("delete");
        assert_eq!(outcome.pruned_parent, Some(root.join("1/2024-01-01")));
    }

    #[test]
    fn vanished_unit_is_deletion_error() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        let ghost = RetentionUnit::new(root.join("1/2024-01-01/9"), 9);

        let mut deleter = FsDeleter::new(root, true);
        assert!(matches!(
            deleter.delete_unit(&ghost),
            Err(Error::Deletion { .. })
        ));
    }
}

//! Disk usage probing for the monitored mount.

use std::path::Path;

use crate::{Error, Result};

/// Snapshot of a volume's usage. Valid only at the instant of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeState {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl VolumeState {
    /// Free space as a fraction of total, in `[0, 1]`. `None` when the
    /// volume reports no capacity.
    pub fn free_fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.free_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0))
    }
}

/// Source of volume usage readings.
///
/// Implementations must not cache: every call reflects the filesystem as it
/// is right now.
pub trait VolumeProbe {
    fn state(&mut self, path: &Path) -> Result<VolumeState>;

    /// Fails with [`Error::Probe`] when the volume reports zero capacity.
    fn free_fraction(&mut self, path: &Path) -> Result<f64> {
        self.state(path)?.free_fraction().ok_or_else(|| Error::Probe {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "volume reports zero total capacity",
            ),
        })
    }
}

impl<P: VolumeProbe + ?Sized> VolumeProbe for &mut P {
    fn state(&mut self, path: &Path) -> Result<VolumeState> {
        (**self).state(path)
    }
}

/// Probe backed by `statvfs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatVfsProbe;

impl VolumeProbe for StatVfsProbe {
    #[cfg(unix)]
    fn state(&mut self, path: &Path) -> Result<VolumeState> {
        use std::ffi::CString;
        use std::io;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::Probe {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path contains a nul byte"),
        })?;

        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        // SAFETY: c_path is nul-terminated and stat is a valid out pointer.
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(Error::Probe {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }

        let frsize = stat.f_frsize as u64;
        let blocks = stat.f_blocks as u64;
        let total_bytes = blocks.saturating_mul(frsize);
        let free_bytes = (stat.f_bavail as u64).saturating_mul(frsize);
        let used_bytes = blocks
            .saturating_sub(stat.f_bfree as u64)
            .saturating_mul(frsize);

        Ok(VolumeState {
            total_bytes,
            used_bytes,
            free_bytes,
        })
    }

    #[cfg(not(unix))]
    fn state(&mut self, _path: &Path) -> Result<VolumeState> {
        Err(Error::Unsupported("disk usage probe requires statvfs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_fraction_of_state() {
        let state = VolumeState {
            total_bytes: 1000,
            used_bytes: 850,
            free_bytes: 150,
        };
        let fraction = state.free_fraction().expect("capacity");
        assert!((fraction - 0.15).abs() < 1e-12);
    }

    struct ZeroCapacity;

    impl VolumeProbe for ZeroCapacity {
        fn state(&mut self, _path: &Path) -> Result<VolumeState> {
            Ok(VolumeState {
                total_bytes: 0,
                used_bytes: 0,
                free_bytes: 0,
            })
        }
    }

    #[test]
    fn zero_total_has_no_free_fraction() {
        let state = ZeroCapacity.state(Path::new("/v")).expect("state");
        assert_eq!(state.free_fraction(), None);
        assert!(matches!(
            ZeroCapacity.free_fraction(Path::new("/v")),
            Err(Error::Probe { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn statvfs_reads_temp_volume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = StatVfsProbe.state(dir.path()).expect("statvfs");
        assert!(state.total_bytes > 0);
        assert!(state.free_bytes <= state.total_bytes);
        let fraction = StatVfsProbe.free_fraction(dir.path()).expect("fraction");
        assert!((0.0..=1.0).contains(&fraction));
    }

    #[cfg(unix)]
    #[test]
    fn statvfs_missing_path_is_probe_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(matches!(
            StatVfsProbe.state(&missing),
            Err(Error::Probe { .. })
        ));
    }
}

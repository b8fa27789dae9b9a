//! Candidate discovery.
//!
//! Walks the working directory, keeps directories the [`UnitMatcher`]
//! recognises and orders them by their key. Discovery happens fresh on every
//! run; nothing is persisted between invocations.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::lifecycle::RetentionUnit;
use crate::report::{Reporter, SweepEvent};
use crate::{Error, Result};

/// Recognises retention unit directories and extracts their ordering key.
pub trait UnitMatcher {
    /// `Some(key)` if `path` is a retention unit.
    fn ordering_key(&self, path: &Path) -> Option<u64>;
}

/// Regex over the absolute path string.
///
/// The key is taken from the `key` capture group when the pattern has one,
/// otherwise from the trailing digits of the path.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid unit pattern: {e}")))?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl UnitMatcher for PatternMatcher {
    fn ordering_key(&self, path: &Path) -> Option<u64> {
        let text = path.to_string_lossy();
        let caps = self.regex.captures(&text)?;
        match caps.name("key") {
            Some(key) => key.as_str().parse().ok(),
            None => trailing_number(&text),
        }
    }
}

fn trailing_number(text: &str) -> Option<u64> {
    let digits = text.len() - text.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    text[text.len() - digits..].parse().ok()
}

/// Candidates for one sweep, newest first.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    // Sorted descending so the oldest unit sits at the tail.
    units: Vec<RetentionUnit>,
}

impl CandidateList {
    pub fn new(mut units: Vec<RetentionUnit>) -> Self {
        units.sort_unstable_by(|a, b| b.cmp(a));
        units.dedup();
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &RetentionUnit> {
        self.units.iter()
    }

    pub fn oldest(&self) -> Option<&RetentionUnit> {
        self.units.last()
    }

    pub fn pop_oldest(&mut self) -> Option<RetentionUnit> {
        self.units.pop()
    }
}

/// Discover retention units under `root`.
///
/// `root` itself is never a candidate. Symlinked directories are not
/// followed. An unreadable `root` fails the call; unreadable directories
/// below it are reported and skipped.
pub fn locate_candidates(
    root: &Path,
    matcher: &dyn UnitMatcher,
    reporter: &mut dyn Reporter,
) -> Result<CandidateList> {
    let dirs = collect_dirs(root, reporter)?;

    let units = dirs
        .into_iter()
        .filter(|dir| dir.as_path() != root)
        .filter_map(|dir| {
            let key = matcher.ordering_key(&dir)?;
            Some(RetentionUnit::new(dir, key))
        })
        .collect();

    Ok(CandidateList::new(units))
}

/// Every directory under `root`, including `root`, each exactly once.
fn collect_dirs(root: &Path, reporter: &mut dyn Reporter) -> Result<BTreeSet<PathBuf>> {
    let mut seen = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if !seen.insert(dir.clone()) {
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if dir.as_path() == root => return Err(Error::Walk { path: dir, source }),
            Err(err) => {
                reporter.emit(SweepEvent::WalkSkipped {
                    path: dir,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    reporter.emit(SweepEvent::WalkSkipped {
                        path: dir.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            // DirEntry::file_type does not follow symlinks.
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                pending.push(entry.path());
            }
        }
    }

    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_UNIT_PATTERN;
    use crate::report::MemoryReporter;
    use tempfile::TempDir;

    fn default_matcher() -> PatternMatcher {
        PatternMatcher::new(DEFAULT_UNIT_PATTERN).expect("default pattern")
    }

    fn mkdirs(root: &Path, rels: &[&str]) {
        for rel in rels {
            fs::create_dir_all(root.join(rel)).expect("create dir");
        }
    }

    #[test]
    fn default_pattern_matches_unit_layout() {
        let matcher = default_matcher();
        assert_eq!(
            matcher.ordering_key(Path::new("/video/12/2024-03-01/1700")),
            Some(1700)
        );
        assert_eq!(
            matcher.ordering_key(Path::new("/video/cam3/2024-03-01/42")),
            Some(42)
        );
        assert_eq!(matcher.ordering_key(Path::new("/video/12/2024-03-01")), None);
        assert_eq!(matcher.ordering_key(Path::new("/video/12")), None);
        assert_eq!(
            matcher.ordering_key(Path::new("/video/cam/2024-03-01/42")),
            None
        );
        assert_eq!(
            matcher.ordering_key(Path::new("/video/1/2024-03-01/42/sub")),
            None
        );
    }

    #[test]
    fn pattern_without_key_group_uses_trailing_digits() {
        let matcher = PatternMatcher::new(r"rec-\d+$").expect("pattern");
        assert_eq!(matcher.ordering_key(Path::new("/data/rec-0099")), Some(99));
        assert_eq!(matcher.ordering_key(Path::new("/data/rec-x")), None);
    }

    #[test]
    fn overflowing_key_is_not_a_unit() {
        let matcher = default_matcher();
        let path = "/v/1/2024-01-01/999999999999999999999999";
        assert_eq!(matcher.ordering_key(Path::new(path)), None);
    }

    #[test]
    fn invalid_pattern_rejected() {
        assert!(matches!(PatternMatcher::new("[a-"), Err(Error::Config(_))));
    }

    #[test]
    fn candidate_list_pops_oldest_first() {
        let mut list = CandidateList::new(vec![
            RetentionUnit::new("/v/1/2024-01-02/3", 3),
            RetentionUnit::new("/v/1/2024-01-01/1", 1),
            RetentionUnit::new("/v/2/2024-01-01/2", 2),
        ]);

        let newest: Vec<u64> = list.newest_first().map(|u| u.key).collect();
        assert_eq!(newest, vec![3, 2, 1]);
        assert_eq!(list.oldest().map(|u| u.key), Some(1));

        let popped: Vec<u64> = std::iter::from_fn(|| list.pop_oldest())
            .map(|u| u.key)
            .collect();
        assert_eq!(popped, vec![1, 2, 3]);
        assert!(list.is_empty());
    }

    #[test]
    fn locate_finds_units_across_sources() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        mkdirs(
            root,
            &[
                "1/2024-01-01/10",
                "1/2024-01-01/11",
                "1/2024-01-02/12",
                "2/2024-01-01/5",
                "2/2024-01-01/5/segments",
                "notes/misc",
            ],
        );
        fs::write(root.join("1/2024-01-01/10/a.mp4"), b"x").expect("write");

        let mut reporter = MemoryReporter::new();
        let list = locate_candidates(root, &default_matcher(), &mut reporter)
            .expect("locate");

        let keys: Vec<u64> = list.newest_first().map(|u| u.key).collect();
        assert_eq!(keys, vec![12, 11, 10, 5]);
        assert_eq!(list.oldest().map(|u| u.path.clone()), Some(root.join("2/2024-01-01/5")));
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn locate_empty_tree() {
        let temp = TempDir::new().expect("tempdir");
        let mut reporter = MemoryReporter::new();
        let list = locate_candidates(temp.path(), &default_matcher(), &mut reporter)
            .expect("locate");
        assert!(list.is_empty());
    }

    #[test]
    fn locate_missing_root_is_walk_error() {
        let temp = TempDir::new().expect("tempdir");
        let mut reporter = MemoryReporter::new();
        let result = locate_candidates(
            &temp.path().join("absent"),
            &default_matcher(),
            &mut reporter,
        );
        assert!(matches!(result, Err(Error::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn locate_does_not_follow_symlinks() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("root");
        mkdirs(&root, &["1/2024-01-01/1"]);
        let outside = temp.path().join("outside");
        mkdirs(&outside, &["2024-01-01/7"]);
        std::os::unix::fs::symlink(&outside, root.join("9")).expect("symlink");

        let mut reporter = MemoryReporter::new();
        let list = locate_candidates(&root, &default_matcher(), &mut reporter)
            .expect("locate");
        let keys: Vec<u64> = list.newest_first().map(|u| u.key).collect();
        assert_eq!(keys, vec![1]);
    }
}

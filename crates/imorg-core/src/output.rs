use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::scheduler::run_tasks;
use crate::types::{FileRecord, RunSummary};

/// One planned copy of a source file into the destination tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub source: PathBuf,
    pub target: PathBuf,
    pub expected_size: u64,
}

/// Assigns destination paths before any copy starts.
///
/// Target names are claimed sequentially, so by the time copies run in
/// parallel no two tasks share a target. A collision — the preferred name
/// already claimed in this run, or already present on disk from a prior
/// run — is resolved with a suffix derived from the source path: first
/// `-<h>` where `<h>` is the leading 16 hex digits of the SHA-256 of the
/// absolute source path, then `-<h>-1`, `-<h>-2`, and so on. The suffix is
/// a pure function of the source path, so planning is deterministic and
/// nothing already in the destination is ever overwritten.
#[derive(Debug, Default)]
pub struct PlacementPlanner {
    claimed: HashSet<PathBuf>,
}

impl PlacementPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan one copy, keeping the preferred target when free and otherwise
    /// deriving a collision-safe name.
    pub fn plan(&mut self, record: &FileRecord, preferred: PathBuf) -> CopyTask {
        let target = self.claim(&record.path, preferred);
        CopyTask {
            source: record.path.clone(),
            target,
            expected_size: record.size,
        }
    }

    fn claim(&mut self, source: &Path, preferred: PathBuf) -> PathBuf {
        if self.is_available(&preferred) {
            self.claimed.insert(preferred.clone());
            return preferred;
        }

        let suffix = path_suffix(source);
        let mut candidate = with_suffix(&preferred, &suffix);
        let mut n = 1usize;
        while !self.is_available(&candidate) {
            candidate = with_suffix(&preferred, &format!("{}-{}", suffix, n));
            n += 1;
        }

        debug!(
            "Collision on {}, placing {} as {}",
            preferred.display(),
            source.display(),
            candidate.display()
        );
        self.claimed.insert(candidate.clone());
        candidate
    }

    fn is_available(&self, candidate: &Path) -> bool {
        !self.claimed.contains(candidate) && !candidate.exists()
    }
}

/// Deterministic disambiguation suffix derived from the source path
fn path_suffix(source: &Path) -> String {
    let digest = Sha256::digest(source.to_string_lossy().as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

fn with_suffix(preferred: &Path, suffix: &str) -> PathBuf {
    let stem = preferred
        .file_stem()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = preferred
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();
    preferred.with_file_name(format!("{}-{}{}", stem, suffix, extension))
}

/// Execute one planned copy, verifying the copied size against the source.
///
/// Creating the parent directory is idempotent, so concurrent tasks racing
/// on the same bucket directory all succeed.
pub fn execute_copy(task: &CopyTask) -> Result<()> {
    if let Some(parent) = task.target.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = fs::copy(&task.source, &task.target)?;
    if written != task.expected_size {
        return Err(Error::CopyVerification {
            path: task.target.clone(),
            written,
            expected: task.expected_size,
        });
    }

    Ok(())
}

/// Run every planned copy through the worker pool, folding the outcomes
/// into the summary.
pub fn copy_all(tasks: &[CopyTask], workers: usize, label: &str, summary: &mut RunSummary) {
    let results = run_tasks(tasks, execute_copy, workers, label);
    for (task, result) in tasks.iter().zip(results) {
        match result {
            Ok(()) => summary.copied += 1,
            Err(err) => summary.record_failure(task.source.clone(), err),
        }
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(path: PathBuf, size: u64) -> FileRecord {
        FileRecord {
            relative_path: PathBuf::from(path.file_name().unwrap()),
            path,
            size,
        }
    }

    #[test]
    fn test_free_target_keeps_preferred_name() {
        let dir = tempdir().unwrap();
        let mut planner = PlacementPlanner::new();

        let task = planner.plan(
            &record(dir.path().join("src/a.jpg"), 3),
            dir.path().join("out/a.jpg"),
        );
        assert_eq!(task.target, dir.path().join("out/a.jpg"));
    }

    #[test]
    fn test_second_source_with_same_name_gets_suffixed() {
        let dir = tempdir().unwrap();
        let mut planner = PlacementPlanner::new();
        let preferred = dir.path().join("out/a.jpg");

        let first = planner.plan(&record(dir.path().join("one/a.jpg"), 3), preferred.clone());
        let second = planner.plan(&record(dir.path().join("two/a.jpg"), 3), preferred.clone());

        assert_eq!(first.target, preferred);
        assert_ne!(second.target, first.target);

        let name = second.target.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("a-"));
        assert!(name.ends_with(".jpg"));
        // stem + '-' + 16 hex digits + extension
        assert_eq!(name.len(), "a-".len() + 16 + ".jpg".len());
    }

    #[test]
    fn test_suffix_is_deterministic_per_source() {
        let dir = tempdir().unwrap();
        let preferred = dir.path().join("out/a.jpg");
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(&preferred, b"from an earlier run").unwrap();

        // Two independent planning passes over the same occupied target pick
        // the same disambiguated name for the same source.
        let source = record(dir.path().join("one/a.jpg"), 3);
        let first = PlacementPlanner::new().plan(&source, preferred.clone());
        let second = PlacementPlanner::new().plan(&source, preferred.clone());

        assert_ne!(first.target, preferred);
        assert_eq!(first.target, second.target);
    }

    #[test]
    fn test_existing_target_on_disk_is_never_reused() {
        let dir = tempdir().unwrap();
        let preferred = dir.path().join("out/a.jpg");
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(&preferred, b"keep me").unwrap();

        let mut planner = PlacementPlanner::new();
        let task = planner.plan(&record(dir.path().join("src/a.jpg"), 3), preferred.clone());

        assert_ne!(task.target, preferred);
        assert_eq!(fs::read(&preferred).unwrap(), b"keep me");
    }

    #[test]
    fn test_execute_copy_creates_directories_and_verifies_size() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        fs::write(&source, b"image bytes").unwrap();

        let task = CopyTask {
            source: source.clone(),
            target: dir.path().join("out/2022/03/a.jpg"),
            expected_size: b"image bytes".len() as u64,
        };

        execute_copy(&task).unwrap();
        assert_eq!(fs::read(&task.target).unwrap(), b"image bytes");

        // Re-creating the directories is not an error
        execute_copy(&CopyTask {
            target: dir.path().join("out/2022/03/b.jpg"),
            ..task.clone()
        })
        .unwrap();
    }

    #[test]
    fn test_size_mismatch_is_reported() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        fs::write(&source, b"image bytes").unwrap();

        let task = CopyTask {
            source,
            target: dir.path().join("out/a.jpg"),
            expected_size: 999,
        };

        assert!(matches!(
            execute_copy(&task),
            Err(Error::CopyVerification { .. })
        ));
    }

    #[test]
    fn test_copy_all_counts_failures_without_aborting() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.jpg");
        fs::write(&good, b"ok").unwrap();

        let tasks = vec![
            CopyTask {
                source: dir.path().join("missing.jpg"),
                target: dir.path().join("out/missing.jpg"),
                expected_size: 2,
            },
            CopyTask {
                source: good.clone(),
                target: dir.path().join("out/good.jpg"),
                expected_size: 2,
            },
        ];

        let mut summary = RunSummary::default();
        copy_all(&tasks, 2, "copying", &mut summary);

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, dir.path().join("missing.jpg"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hash algorithm used to match file content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Grouping resolution for capture timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Year,
    #[default]
    Month,
    Day,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Year => write!(f, "year"),
            Granularity::Month => write!(f, "month"),
            Granularity::Day => write!(f, "day"),
        }
    }
}

/// Configuration for a `diff` run
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// First source directory
    pub src1: PathBuf,

    /// Second source directory
    pub src2: PathBuf,

    /// Destination directory for the partitioned output
    pub dest: PathBuf,

    /// Hash algorithm used to match file content
    pub algorithm: HashAlgorithm,

    /// Number of worker threads (0 = auto)
    pub workers: usize,
}

impl DiffConfig {
    /// Check for fatal configuration errors before any file is processed
    pub fn validate(&self) -> Result<()> {
        validate_source(&self.src1)?;
        validate_source(&self.src2)?;
        validate_dest(&self.dest, &[&self.src1, &self.src2])
    }

    /// Worker count with the `0 = auto` convention resolved
    pub fn resolved_workers(&self) -> usize {
        resolve_workers(self.workers)
    }
}

/// Configuration for a `groupby` run
#[derive(Debug, Clone)]
pub struct GroupByConfig {
    /// Source directory
    pub src: PathBuf,

    /// Destination directory for the grouped output
    pub dest: PathBuf,

    /// Grouping resolution for capture timestamps
    pub granularity: Granularity,

    /// Number of worker threads (0 = auto)
    pub workers: usize,
}

impl GroupByConfig {
    /// Check for fatal configuration errors before any file is processed
    pub fn validate(&self) -> Result<()> {
        validate_source(&self.src)?;
        validate_dest(&self.dest, &[&self.src])
    }

    /// Worker count with the `0 = auto` convention resolved
    pub fn resolved_workers(&self) -> usize {
        resolve_workers(self.workers)
    }
}

/// Resolve the configured worker count; `0` means one worker per logical CPU
pub fn resolve_workers(workers: usize) -> usize {
    if workers == 0 {
        num_cpus::get().max(1)
    } else {
        workers
    }
}

fn validate_source(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }
    Ok(())
}

fn validate_dest(dest: &Path, sources: &[&Path]) -> Result<()> {
    if dest.exists() && !dest.is_dir() {
        return Err(Error::Configuration(format!(
            "destination ({}) exists and is not a directory",
            dest.display()
        )));
    }

    let dest = normalize(dest);
    for source in sources {
        let source = normalize(source);
        if dest == source {
            return Err(Error::Configuration(format!(
                "destination ({}) is the same as a source directory",
                dest.display()
            )));
        }
        if dest.starts_with(&source) {
            return Err(Error::Configuration(format!(
                "destination ({}) is nested inside a source directory ({})",
                dest.display(),
                source.display()
            )));
        }
    }
    Ok(())
}

/// Absolute form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the remaining components are re-appended.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if parent.as_os_str().is_empty() => std::env::current_dir()
            .map(|cwd| cwd.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        (Some(parent), Some(name)) => normalize(parent).join(name),
        _ => path.to_path_buf(),
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn diff_config(src1: PathBuf, src2: PathBuf, dest: PathBuf) -> DiffConfig {
        DiffConfig {
            src1,
            src2,
            dest,
            algorithm: HashAlgorithm::default(),
            workers: 1,
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
        assert_eq!(Granularity::default(), Granularity::Month);
        assert_eq!(HashAlgorithm::Sha512.to_string(), "sha512");
        assert_eq!(Granularity::Day.to_string(), "day");
    }

    #[test]
    fn test_resolve_workers() {
        assert_eq!(resolve_workers(1), 1);
        assert_eq!(resolve_workers(8), 8);
        assert!(resolve_workers(0) >= 1);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempdir().unwrap();
        let config = diff_config(
            dir.path().join("missing"),
            dir.path().to_path_buf(),
            dir.path().join("out"),
        );
        assert!(matches!(
            config.validate(),
            Err(Error::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_dest_equal_to_source_is_fatal() {
        let dir = tempdir().unwrap();
        let config = GroupByConfig {
            src: dir.path().to_path_buf(),
            dest: dir.path().to_path_buf(),
            granularity: Granularity::Month,
            workers: 1,
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_dest_nested_inside_source_is_fatal() {
        let dir = tempdir().unwrap();
        let config = GroupByConfig {
            src: dir.path().to_path_buf(),
            dest: dir.path().join("nested/out"),
            granularity: Granularity::Month,
            workers: 1,
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_sibling_dest_is_accepted() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();

        let config = GroupByConfig {
            src,
            dest: dir.path().join("out"),
            granularity: Granularity::Month,
            workers: 1,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_existing_dest_directory_is_accepted() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("out");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(&dest).unwrap();

        let config = diff_config(src.clone(), src, dest);
        assert!(config.validate().is_ok());
    }
}

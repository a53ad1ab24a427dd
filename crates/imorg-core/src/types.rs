use chrono::{DateTime, Datelike, Local};
use log::error;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

use crate::config::{Granularity, HashAlgorithm};

/// Supported image formats
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Heic,
    Other(String),
}

impl ImageFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            "tif" | "tiff" => Self::Tiff,
            "webp" => Self::Webp,
            "heic" => Self::Heic,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// A candidate file enumerated from a source root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path to the image file
    pub path: PathBuf,

    /// Path relative to the source root it was enumerated from
    pub relative_path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Base name of the source file
    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

/// Digest of a file's byte content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDigest {
    /// Raw digest bytes
    pub bytes: Vec<u8>,

    /// Algorithm that produced the digest
    pub algorithm: HashAlgorithm,
}

impl FileDigest {
    /// Render the digest as lowercase hex
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Where a resolved capture timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Parsed from an embedded EXIF datetime tag
    Exif,

    /// Filesystem modification time fallback
    FileModified,
}

/// Capture timestamp resolved for one file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureTime {
    pub timestamp: DateTime<Local>,
    pub source: TimestampSource,
}

/// Per-file outcome of comparing two file sets by digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    /// Identical content exists on both sides
    Matched {
        first: FileRecord,
        second: FileRecord,
    },

    /// Content exists only under the first source root
    OnlyInFirst(FileRecord),

    /// Content exists only under the second source root
    OnlyInSecond(FileRecord),
}

/// Bucket key for grouping by capture date at a configured granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl GroupKey {
    /// Build a bucket key from a capture date, keeping only the components
    /// the granularity asks for.
    pub fn from_date(date: &impl Datelike, granularity: Granularity) -> Self {
        Self {
            year: date.year(),
            month: match granularity {
                Granularity::Year => None,
                Granularity::Month | Granularity::Day => Some(date.month()),
            },
            day: match granularity {
                Granularity::Year | Granularity::Month => None,
                Granularity::Day => Some(date.day()),
            },
        }
    }

    /// Relative destination directory for this bucket,
    /// `<year>[/<month>[/<day>]]` with zero-padded components.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(format!("{:04}", self.year));
        if let Some(month) = self.month {
            dir.push(format!("{:02}", month));
        }
        if let Some(day) = self.day {
            dir.push(format!("{:02}", day));
        }
        dir
    }
}

/// A failure scoped to one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate outcome of one diff or groupby run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Image files enumerated across all source roots
    pub discovered: usize,

    /// Non-image files skipped during discovery
    pub skipped_non_image: usize,

    /// Files copied into the destination
    pub copied: usize,

    /// Capture timestamps that fell back to the filesystem mtime
    pub timestamp_fallbacks: usize,

    /// Per-file failures collected across all phases
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    /// Whether the run completed without any per-file failure
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record a per-file failure without aborting the batch
    pub fn record_failure(&mut self, path: PathBuf, reason: impl fmt::Display) {
        let reason = reason.to_string();
        error!("{}: {}", path.display(), reason);
        self.failures.push(FileFailure { path, reason });
    }
}

// -- Tests --

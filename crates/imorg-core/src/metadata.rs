use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag};
use log::warn;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;
use crate::types::{CaptureTime, TimestampSource};

/// EXIF datetime tags in order of preference
const DATETIME_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Datetime renderings seen in the wild
const DATETIME_FORMATS: [&str; 3] = [
    "%Y:%m:%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Resolve the capture timestamp of an image file.
///
/// The EXIF datetime tags are checked in order of preference; a file with
/// absent or malformed metadata degrades to its filesystem modification time
/// with the source marked accordingly. Only failure to open or stat the file
/// is an error.
pub fn extract_capture_time(path: &Path) -> Result<CaptureTime> {
    let file = File::open(path)?;

    if let Some(timestamp) = read_exif_datetime(&file, path) {
        return Ok(CaptureTime {
            timestamp,
            source: TimestampSource::Exif,
        });
    }

    let modified = fs::metadata(path)?.modified()?;
    Ok(CaptureTime {
        timestamp: DateTime::from(modified),
        source: TimestampSource::FileModified,
    })
}

fn read_exif_datetime(file: &File, path: &Path) -> Option<DateTime<Local>> {
    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(err) => {
            warn!(
                "{}: no readable EXIF metadata ({}), falling back to file mtime",
                path.display(),
                err
            );
            return None;
        }
    };

    for tag in DATETIME_TAGS {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        let raw = field.display_value().to_string();
        if let Some(timestamp) = parse_datetime(&raw) {
            return Some(timestamp);
        }
        warn!(
            "{}: EXIF tag {} holds unparseable datetime {:?}",
            path.display(),
            tag,
            raw
        );
    }

    warn!(
        "{}: no EXIF capture timestamp, falling back to file mtime",
        path.display()
    );
    None
}

fn parse_datetime(raw: &str) -> Option<DateTime<Local>> {
    let normalized = raw.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Some(local);
            }
        }
    }

    None
}

// -- Tests --

use log::debug;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{FileRecord, ImageFormat, RunSummary};

/// Enumerate the image files under a source root.
///
/// The traversal is sorted so repeated runs over the same tree see the same
/// sequence. Non-image files are skipped and counted; a file whose metadata
/// cannot be read becomes a per-file failure rather than aborting the scan.
pub fn discover_images(root: &Path, summary: &mut RunSummary) -> Result<Vec<FileRecord>> {
    if !root.is_dir() {
        return Err(Error::SourceNotFound(root.to_path_buf()));
    }

    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                summary.record_failure(path, &err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_image_path(path) {
            debug!("Skipping non-image file {}", path.display());
            summary.skipped_non_image += 1;
            continue;
        }

        let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        match fs::metadata(path) {
            Ok(metadata) => records.push(FileRecord {
                path: path.to_path_buf(),
                relative_path,
                size: metadata.len(),
            }),
            Err(err) => summary.record_failure(path.to_path_buf(), Error::Io(err)),
        }
    }

    summary.discovered += records.len();
    Ok(records)
}

/// Returns if the given path has a supported image extension
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ImageFormat::from_extension(ext).is_supported())
        .unwrap_or(false)
}

// -- Tests --

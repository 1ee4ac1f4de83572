//! Archive Locator
//!
//! Finds the first recognized archive below a location. The walk is sorted by
//! file name so repeated calls against an unchanged tree return the same
//! archive, and it never descends into [`EXTRACTED_DIR`] sub-directories.

use crate::error::{Error, Result};
use crate::types::{ArchiveType, EXTRACTED_DIR};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// True for entries below the root that are named `extracted`
fn is_extracted_output(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == EXTRACTED_DIR
}

/// Walk `root` and return the first regular file with a recognized archive suffix.
///
/// `root` may itself be a file, in which case only that file is tested.
/// Returns `Ok(None)` when nothing matches; traversal failures (missing root,
/// permission denied) are returned as [`Error::Traversal`].
pub fn locate(root: &Path) -> Result<Option<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_extracted_output(entry));

    for entry in walker {
        let entry = entry.map_err(|e| Error::Traversal {
            path: e.path().unwrap_or(root).to_path_buf(),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(archive_type) = ArchiveType::from_path(entry.path()) {
            debug!(?root, archive = ?entry.path(), ?archive_type, "found archive");
            return Ok(Some(entry.into_path()));
        }
    }

    debug!(?root, "no archive found");
    Ok(None)
}

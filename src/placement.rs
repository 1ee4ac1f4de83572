//! Placement Resolver
//!
//! Moves a staged extraction into `<target_parent>/extracted`. The first
//! attempt is a single directory rename. If that fails for any reason, the
//! tree is copied file by file: each file is copied to a uuid-suffixed sibling
//! of its final path and then renamed over it, so a reader of the destination
//! never sees a half-written file.
//!
//! The fallback does not roll back: when a copy or rename fails part way, the
//! files already placed stay where they are.

use crate::error::{Error, PlacementError, Result};
use crate::types::EXTRACTED_DIR;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Move `source_dir` to `<target_parent>/extracted`, returning the final path.
///
/// Any rename failure triggers the copy fallback. Cross-device moves are the
/// expected cause, but the error kind is not inspected.
pub async fn place(source_dir: &Path, target_parent: &Path) -> Result<PathBuf> {
    let destination = target_parent.join(EXTRACTED_DIR);

    match try_atomic_move(source_dir, &destination).await {
        Ok(()) => {
            info!(?source_dir, ?destination, "moved extracted content into place");
            return Ok(destination);
        }
        Err(e) => {
            warn!(
                ?source_dir,
                ?destination,
                error = %e,
                kind = ?e.kind(),
                "rename failed, falling back to copy"
            );
        }
    }

    let source = source_dir.to_path_buf();
    let dest = destination.clone();
    let copied = spawn_blocking(move || copy_then_rename_each_file(&source, &dest))
        .await
        .map_err(|e| PlacementError::TaskPanicked(e.to_string()))??;

    info!(
        ?source_dir,
        ?destination,
        files = copied,
        "copied extracted content into place"
    );
    Ok(destination)
}

/// Relocate `source` to `dest` with a single rename
pub async fn try_atomic_move(source: &Path, dest: &Path) -> std::io::Result<()> {
    tokio::fs::rename(source, dest).await
}

/// Recursively copy `source` into `dest`, making each file appear atomically.
///
/// Directories are recreated at their relative path. Files are copied to
/// [`obfuscated_sibling`] of their final path, then renamed into place.
/// Sub-directories named `extracted` are skipped. Returns the number of files
/// placed; stops at the first failure.
pub fn copy_then_rename_each_file(source: &Path, dest: &Path) -> Result<usize> {
    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != EXTRACTED_DIR);

    let mut placed = 0;
    for entry in walker {
        let entry = entry.map_err(|e| Error::Traversal {
            path: e.path().unwrap_or(source).to_path_buf(),
            reason: e.to_string(),
        })?;

        let relative = entry.path().strip_prefix(source).map_err(|e| {
            PlacementError::InvalidPath {
                path: entry.path().to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| PlacementError::CopyFailed {
                source_path: entry.path().to_path_buf(),
                dest_path: target.clone(),
                reason: e.to_string(),
            })?;
            continue;
        }

        let staging = obfuscated_sibling(&target)?;
        debug!(source = ?entry.path(), ?staging, "copying file");

        std::fs::copy(entry.path(), &staging).map_err(|e| PlacementError::CopyFailed {
            source_path: entry.path().to_path_buf(),
            dest_path: staging.clone(),
            reason: e.to_string(),
        })?;

        std::fs::rename(&staging, &target).map_err(|e| PlacementError::RenameFailed {
            source_path: staging.clone(),
            dest_path: target.clone(),
            reason: e.to_string(),
        })?;

        placed += 1;
    }

    Ok(placed)
}

/// `path` with a fresh v4 uuid appended to its file name
pub fn obfuscated_sibling(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| PlacementError::InvalidPath {
        path: path.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;

    let mut obfuscated = name.to_os_string();
    obfuscated.push(uuid::Uuid::new_v4().to_string());
    Ok(path.with_file_name(obfuscated))
}

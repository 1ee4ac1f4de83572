use crate::error::{Error, ExtractionError, Result};
use crate::types::ArchiveType;
use std::path::{Component, Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Shared driver for the per-format extractors.
///
/// Runs `try_extract_fn` on the blocking pool so a large archive never stalls
/// the runtime that drives the ledger and the tick loop. This is the single
/// implementation behind every `extract` entry point of the format extractors.
pub(crate) async fn extract_blocking_impl(
    archive_type: ArchiveType,
    try_extract_fn: impl FnOnce(&Path, &Path) -> Result<Vec<PathBuf>> + Send + 'static,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>> {
    info!(
        ?archive_path,
        ?dest_path,
        "attempting {} extraction",
        archive_type.as_str()
    );

    let archive_path_owned = archive_path.to_path_buf();
    let dest_path_owned = dest_path.to_path_buf();

    let result = spawn_blocking(move || try_extract_fn(&archive_path_owned, &dest_path_owned))
        .await
        .map_err(|e| {
            Error::Extraction(ExtractionError::TaskPanicked {
                archive: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

    match &result {
        Ok(files) => {
            info!(
                ?archive_path,
                extracted_count = files.len(),
                "{} extraction successful",
                archive_type.as_str()
            );
        }
        Err(e) => {
            warn!(
                ?archive_path,
                error = %e,
                "{} extraction failed",
                archive_type.as_str()
            );
        }
    }

    result
}

/// Build an [`ExtractionError::Failed`] for `archive_path`
pub(crate) fn extraction_failed(archive_path: &Path, reason: impl Into<String>) -> Error {
    Error::Extraction(ExtractionError::Failed {
        archive: archive_path.to_path_buf(),
        reason: reason.into(),
    })
}

/// Create the destination directory if it doesn't exist
pub(crate) fn create_destination(dest_path: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "failed to create destination {}: {}",
                dest_path.display(),
                e
            ),
        ))
    })
}

/// Resolve an archive entry name to a path relative to the destination.
///
/// Root and prefix components are dropped and `..` pops the previous
/// component, so `a/../b.txt` becomes `b.txt`. Returns `None` when the name
/// would climb above the destination (`../../etc/passwd`) or resolves to
/// nothing at all.
pub(crate) fn sanitize_entry_path(name: &Path) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();
    for component in name.components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::ParentDir => {
                if !sanitized.pop() {
                    return None;
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    (!sanitized.as_os_str().is_empty()).then_some(sanitized)
}

/// Recursively collect all regular files below `dir`, in file-name order
pub(crate) fn collect_extracted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Traversal {
            path: e.path().unwrap_or(dir).to_path_buf(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    debug!(?dir, count = files.len(), "collected extracted files");
    Ok(files)
}

/// Verify that everything below `dest_path` resolves inside it.
///
/// Decoders that write entries themselves (7z) are checked after the fact, so
/// a symlink or crafted name that escaped the destination is reported as a
/// failed extraction rather than silently accepted.
pub(crate) fn validate_extracted_paths(archive_path: &Path, dest_path: &Path) -> Result<()> {
    let canonical_dest = dest_path.canonicalize()?;

    for entry in WalkDir::new(dest_path).min_depth(1) {
        let entry = entry.map_err(|e| Error::Traversal {
            path: e.path().unwrap_or(dest_path).to_path_buf(),
            reason: e.to_string(),
        })?;
        let canonical = entry.path().canonicalize()?;
        if !canonical.starts_with(&canonical_dest) {
            return Err(extraction_failed(
                archive_path,
                format!(
                    "path traversal detected: extracted file {:?} is outside destination",
                    canonical
                ),
            ));
        }
    }
    Ok(())
}

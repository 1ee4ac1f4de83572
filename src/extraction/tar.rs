use crate::error::Result;
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shared::{
    create_destination, extract_blocking_impl, extraction_failed, sanitize_entry_path,
};

/// Archive extractor for uncompressed TAR files
pub struct TarExtractor;

impl TarExtractor {
    /// Extract a TAR archive into `dest_path`
    ///
    /// Entries are written with `unpack_in`, which refuses names that would
    /// land outside the destination; such entries are skipped with a warning.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting TAR extraction");

        create_destination(dest_path)?;

        let file = std::fs::File::open(archive_path)?;
        let mut archive = tar::Archive::new(file);
        archive.set_preserve_permissions(false);

        let entries = archive.entries().map_err(|e| {
            extraction_failed(archive_path, format!("failed to read TAR archive: {}", e))
        })?;

        let mut extracted_files = Vec::new();
        for entry in entries {
            let mut entry = entry.map_err(|e| {
                extraction_failed(archive_path, format!("failed to read TAR entry: {}", e))
            })?;

            let entry_path = entry
                .path()
                .map_err(|e| extraction_failed(archive_path, format!("invalid entry name: {}", e)))?
                .into_owned();
            let is_file = entry.header().entry_type().is_file();

            let unpacked = entry.unpack_in(dest_path).map_err(|e| {
                extraction_failed(
                    archive_path,
                    format!("failed to extract {}: {}", entry_path.display(), e),
                )
            })?;

            if !unpacked {
                warn!(?archive_path, ?entry_path, "skipping entry with unsafe path");
                continue;
            }

            if is_file && let Some(relative) = sanitize_entry_path(&entry_path) {
                extracted_files.push(dest_path.join(relative));
            }
        }

        Ok(extracted_files)
    }

    /// Extract a TAR archive on the blocking pool
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl(ArchiveType::Tar, Self::try_extract, archive_path, dest_path).await
    }
}

use crate::error::{Error, Result};
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shared::{
    create_destination, extract_blocking_impl, extraction_failed, sanitize_entry_path,
};

/// Archive extractor for RAR files
pub struct RarExtractor;

impl RarExtractor {
    /// Convert an unrar error to our error type
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        extraction_failed(archive_path, e.to_string())
    }

    /// Extract a RAR archive into `dest_path`
    ///
    /// Walks the archive with unrar's header/file state machine. Entry names
    /// are sanitized before anything is written, so `../` entries never leave
    /// the destination.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        create_destination(dest_path)?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();

            let Some(sanitized) = sanitize_entry_path(&header.filename) else {
                warn!(?archive_path, name = ?header.filename, "skipping entry with unsafe path");
                at_header = at_file
                    .skip()
                    .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                continue;
            };

            let file_path = dest_path.join(&sanitized);

            if header.is_directory() {
                std::fs::create_dir_all(&file_path)?;
                at_header = at_file
                    .skip()
                    .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
            } else {
                if let Some(parent) = file_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                at_header = at_file
                    .extract_to(&file_path)
                    .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                extracted_files.push(file_path);
            }
        }

        Ok(extracted_files)
    }

    /// Extract a RAR archive on the blocking pool
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl(ArchiveType::Rar, Self::try_extract, archive_path, dest_path).await
    }
}

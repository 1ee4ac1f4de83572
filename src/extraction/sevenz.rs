use crate::error::Result;
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::shared::{
    collect_extracted_files, create_destination, extract_blocking_impl, extraction_failed,
    validate_extracted_paths,
};

/// Archive extractor for 7z files
pub struct SevenZipExtractor;

impl SevenZipExtractor {
    /// Extract a 7z archive into `dest_path`
    ///
    /// sevenz-rust writes entries itself, so the destination is validated and
    /// scanned afterwards to report what was produced.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting 7z extraction");

        create_destination(dest_path)?;

        sevenz_rust::decompress_file(archive_path, dest_path).map_err(|e| {
            extraction_failed(archive_path, format!("failed to extract 7z archive: {}", e))
        })?;

        validate_extracted_paths(archive_path, dest_path)?;
        collect_extracted_files(dest_path)
    }

    /// Extract a 7z archive on the blocking pool
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl(
            ArchiveType::SevenZip,
            Self::try_extract,
            archive_path,
            dest_path,
        )
        .await
    }
}

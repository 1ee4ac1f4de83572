use crate::error::{Error, Result};
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shared::{
    create_destination, extract_blocking_impl, extraction_failed, sanitize_entry_path,
};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        let entry_path = file.enclosed_name().and_then(sanitize_entry_path);
        let file_path = match entry_path {
            Some(path) => dest_path.join(path),
            None => {
                warn!(?archive_path, name = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create output file {}: {}", file_path.display(), e),
            ))
        })?;

        std::io::copy(&mut file, &mut outfile).map_err(|e| {
            extraction_failed(
                archive_path,
                format!("failed to extract {}: {}", file_path.display(), e),
            )
        })?;

        Ok(Some(file_path))
    }

    /// Extract a ZIP archive into `dest_path`
    ///
    /// Returns the paths of all regular files written.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        create_destination(dest_path)?;

        let file = std::fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            extraction_failed(archive_path, format!("failed to read ZIP archive: {}", e))
        })?;

        let mut extracted_files = Vec::new();
        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|e| {
                extraction_failed(archive_path, format!("failed to read ZIP entry: {}", e))
            })?;

            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        Ok(extracted_files)
    }

    /// Extract a ZIP archive on the blocking pool
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl(ArchiveType::Zip, Self::try_extract, archive_path, dest_path).await
    }
}

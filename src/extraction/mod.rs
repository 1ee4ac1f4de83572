//! Archive extraction
//!
//! This module unpacks RAR, TAR, ZIP and 7z archives into a destination
//! directory. The format is chosen from the archive's file-name suffix (see
//! [`ArchiveType`]); each format has its own extractor that runs on the
//! blocking thread pool.
//!
//! The [`ArchiveDecoder`] trait is the seam between the job runner and the
//! decoders, so the service can be driven with a different decoder (tests use
//! failing and counting decoders).

mod rar;
mod sevenz;
mod shared;
mod tar;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use rar::RarExtractor;
pub use sevenz::SevenZipExtractor;
pub use tar::TarExtractor;
pub use zip::ZipExtractor;

use crate::error::{Error, ExtractionError, Result};
use crate::types::ArchiveType;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Trait for archive decoding
///
/// Implementations fully unpack `archive_path` into `dest_path`, creating the
/// destination if it is absent, and return the paths of the files written.
/// On failure, partially written output is left in place; whoever created
/// the destination owns its cleanup.
#[async_trait]
pub trait ArchiveDecoder: Send + Sync {
    /// Unpack `archive_path` into `dest_path`
    async fn decode(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>>;
}

/// Default decoder: dispatches on the archive suffix to the built-in extractors
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDecoder;

#[async_trait]
impl ArchiveDecoder for FormatDecoder {
    async fn decode(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_archive(archive_path, dest_path).await
    }
}

/// Unified archive extraction dispatcher
///
/// Detects the archive type and routes to the appropriate extractor.
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - List of extracted files on success
/// * `Err(Error)` - Extraction error (corruption, unknown type, I/O, etc.)
///
/// # Example
/// ```no_run
/// use autounpack::extraction::extract_archive;
/// use std::path::Path;
///
/// # async fn example() -> autounpack::error::Result<()> {
/// let files = extract_archive(Path::new("movie.rar"), Path::new("/tmp/extract")).await?;
/// println!("Extracted {} files", files.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    let archive_type = ArchiveType::from_path(archive_path).ok_or_else(|| {
        Error::Extraction(ExtractionError::UnsupportedFormat {
            archive: archive_path.to_path_buf(),
        })
    })?;

    info!(
        ?archive_path,
        ?archive_type,
        "dispatching extraction to appropriate extractor"
    );

    match archive_type {
        ArchiveType::Rar => RarExtractor::extract(archive_path, dest_path).await,
        ArchiveType::SevenZip => SevenZipExtractor::extract(archive_path, dest_path).await,
        ArchiveType::Tar => TarExtractor::extract(archive_path, dest_path).await,
        ArchiveType::Zip => ZipExtractor::extract(archive_path, dest_path).await,
    }
}

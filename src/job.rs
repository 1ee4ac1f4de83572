//! Job execution for promoted locations
//!
//! A job locates the first archive under its location, unpacks it and makes
//! the content appear at `<base>/extracted`, where `<base>` is the location
//! when it is a directory and its parent otherwise. Whatever happens, the job
//! removes its ledger entry when it returns; failures are logged and never
//! retried.

use crate::error::{Error, Result};
use crate::extraction::ArchiveDecoder;
use crate::ledger::Ledger;
use crate::locator;
use crate::placement;
use crate::types::{EXTRACTED_DIR, JobOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

/// Directory that receives `extracted/` for `location`
pub async fn base_dir(location: &Path) -> PathBuf {
    let is_dir = tokio::fs::metadata(location)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    match location.parent() {
        Some(parent) if !is_dir => parent.to_path_buf(),
        _ => location.to_path_buf(),
    }
}

/// Runs promoted jobs
///
/// Cheap to clone; the scheduler hands a clone to every spawned job task.
#[derive(Clone)]
pub struct JobRunner {
    ledger: Arc<Ledger>,
    decoder: Arc<dyn ArchiveDecoder>,
    staging_dir: Option<PathBuf>,
}

impl JobRunner {
    /// Create a runner. With `staging_dir` set, archives are unpacked below it
    /// first and then placed; otherwise they are unpacked in place.
    pub fn new(
        ledger: Arc<Ledger>,
        decoder: Arc<dyn ArchiveDecoder>,
        staging_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            ledger,
            decoder,
            staging_dir,
        }
    }

    /// Process `location` and clear its ledger entry
    pub async fn run(&self, location: &Path) -> Result<JobOutcome> {
        debug!(?location, "processing location");

        let result = self.process(location).await;
        self.ledger.complete(location).await;

        match &result {
            Ok(JobOutcome::NoArchive) => {
                info!(?location, "finished processing, no archive found");
            }
            Ok(JobOutcome::Extracted {
                archive,
                destination,
                file_count,
            }) => {
                info!(
                    ?location,
                    ?archive,
                    ?destination,
                    file_count,
                    "finished processing"
                );
            }
            Err(e) => {
                error!(
                    ?location,
                    error = %e,
                    error_code = e.error_code(),
                    "job failed"
                );
            }
        }

        result
    }

    async fn process(&self, location: &Path) -> Result<JobOutcome> {
        let root = location.to_path_buf();
        let found = spawn_blocking(move || locator::locate(&root))
            .await
            .map_err(|e| Error::Traversal {
                path: location.to_path_buf(),
                reason: e.to_string(),
            })??;

        let Some(archive) = found else {
            return Ok(JobOutcome::NoArchive);
        };
        info!(?location, ?archive, "found archive");

        let base = base_dir(location).await;
        let (destination, file_count) = match &self.staging_dir {
            Some(staging_root) => self.extract_staged(&archive, &base, staging_root).await?,
            None => self.extract_direct(&archive, &base).await?,
        };

        Ok(JobOutcome::Extracted {
            archive,
            destination,
            file_count,
        })
    }

    async fn extract_direct(&self, archive: &Path, base: &Path) -> Result<(PathBuf, usize)> {
        let destination = base.join(EXTRACTED_DIR);
        let files = self.decoder.decode(archive, &destination).await?;
        Ok((destination, files.len()))
    }

    /// Unpack into a fresh temp dir under `staging_root`, then place.
    ///
    /// The temp dir is removed on every path out of this function; a failed
    /// removal is logged and otherwise ignored.
    async fn extract_staged(
        &self,
        archive: &Path,
        base: &Path,
        staging_root: &Path,
    ) -> Result<(PathBuf, usize)> {
        let prefix = archive
            .file_name()
            .map(|name| format!("{}-", name.to_string_lossy()))
            .unwrap_or_default();
        let tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(staging_root)?;
        let unpack_dir = tmp.path().join(EXTRACTED_DIR);
        debug!(?archive, ?unpack_dir, "extracting into staging directory");

        let result = async {
            let files = self.decoder.decode(archive, &unpack_dir).await?;
            let destination = placement::place(&unpack_dir, base).await?;
            Ok::<_, Error>((destination, files.len()))
        }
        .await;

        let tmp_path = tmp.path().to_path_buf();
        if let Err(e) = tmp.close() {
            error!(path = ?tmp_path, error = %e, "failed to clean up staging directory");
        }

        result
    }
}

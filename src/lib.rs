//! # autounpack
//!
//! Watch directories for dropped archives and unpack them once writes settle.
//!
//! Filesystem notifications are folded into a debounce [`Ledger`]: a new
//! entry starts a quiesce timer, later writes push it back. A periodic
//! [`Scheduler`] promotes locations whose timer ran out and spawns one job per
//! location. A job finds the first `.rar`, `.tar`, `.zip` or `.7z` file below
//! the location, unpacks it and leaves the result in an `extracted` directory
//! next to it. With a staging directory configured, archives are unpacked
//! there first and then renamed into place, with a per-file copy fallback
//! when the rename fails.
//!
//! ## Quick Start
//!
//! ```no_run
//! use autounpack::{Config, Service, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         watch_paths: vec!["/srv/drop".into()],
//!         ..Default::default()
//!     };
//!
//!     let service = Service::new(config)?;
//!
//!     // Runs until SIGTERM/SIGINT, then waits for running jobs
//!     run_with_shutdown(service).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command-line interface
pub mod cli;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Filesystem event ingestion
pub mod folder_watcher;
/// Promoted job execution
pub mod job;
/// Debounce ledger
pub mod ledger;
/// Archive lookup below a location
pub mod locator;
/// Logging setup
pub mod logging;
/// Moving extracted content into place
pub mod placement;
/// Tick loop promoting ready locations
pub mod scheduler;
/// Daemon lifecycle
pub mod service;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ExtractionError, PlacementError, Result};
pub use extraction::{ArchiveDecoder, FormatDecoder};
pub use ledger::{Ledger, PendingJob};
pub use scheduler::Scheduler;
pub use service::Service;
pub use types::{ArchiveType, EXTRACTED_DIR, JobOutcome, NotificationKind};

/// How long [`run_with_shutdown`] waits for running jobs after a signal
pub const SHUTDOWN_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Run the service until a termination signal arrives, then shut down cleanly.
///
/// Stops the watcher and the scheduler and gives running jobs up to
/// [`SHUTDOWN_DRAIN_TIMEOUT`] to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
/// Returns the error from [`Service::start`] if watching could not begin.
pub async fn run_with_shutdown(service: Service) -> Result<()> {
    let runner = service.clone();
    let mut daemon = tokio::spawn(async move { runner.start().await });

    let finished = tokio::select! {
        _ = wait_for_signal() => {
            service.stop();
            (&mut daemon).await
        }
        // start() only returns on its own when watching could not begin
        finished = &mut daemon => finished,
    };
    let result = finished.unwrap_or_else(|e| Err(Error::NotificationSource(e.to_string())));

    if !service.drain(SHUTDOWN_DRAIN_TIMEOUT).await {
        tracing::warn!("shutting down with jobs still running");
    }
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "could not register both signal handlers");
            only.recv().await;
            tracing::info!("received termination signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}

//! The daemon: watcher, scheduler and job tasks wired around one ledger.

use crate::config::Config;
use crate::error::Result;
use crate::extraction::{ArchiveDecoder, FormatDecoder};
use crate::folder_watcher::FolderWatcher;
use crate::job::JobRunner;
use crate::ledger::Ledger;
use crate::scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Watches directories and unpacks archives that land in them
///
/// Cloning is cheap and every clone controls the same daemon, so one clone
/// can sit in [`Service::start`] while another calls [`Service::stop`].
#[derive(Clone)]
pub struct Service {
    config: Arc<Config>,
    ledger: Arc<Ledger>,
    decoder: Arc<dyn ArchiveDecoder>,
    cancel: CancellationToken,
    jobs: TaskTracker,
}

impl Service {
    /// Create a service with the built-in decoders
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate
    pub fn new(config: Config) -> Result<Self> {
        Self::with_decoder(config, Arc::new(FormatDecoder))
    }

    /// Create a service that unpacks with `decoder`
    pub fn with_decoder(config: Config, decoder: Arc<dyn ArchiveDecoder>) -> Result<Self> {
        config.validate()?;

        let ledger = Arc::new(Ledger::new(config.quiesce_delay, config.expiry_window));
        Ok(Self {
            config: Arc::new(config),
            ledger,
            decoder,
            cancel: CancellationToken::new(),
            jobs: TaskTracker::new(),
        })
    }

    /// Watch the configured directories until [`Service::stop`] is called.
    ///
    /// Jobs still running when this returns keep running; use
    /// [`Service::drain`] to wait for them.
    ///
    /// # Errors
    /// Returns a notification-source error if a directory cannot be watched.
    pub async fn start(&self) -> Result<()> {
        let mut watcher =
            FolderWatcher::new(Arc::clone(&self.ledger), self.config.watch_paths.clone())?;
        watcher.start()?;

        info!(
            paths = ?self.config.watch_paths,
            quiesce_delay = ?self.config.quiesce_delay,
            tick_interval = ?self.config.tick_interval,
            expiry_window = ?self.config.expiry_window,
            staging_dir = ?self.config.staging_dir,
            "service started"
        );

        let runner = JobRunner::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.decoder),
            self.config.staging_dir.clone(),
        );
        let scheduler = Scheduler::new(
            Arc::clone(&self.ledger),
            runner,
            self.config.tick_interval,
            self.jobs.clone(),
        );
        let scheduler_handle = tokio::spawn(scheduler.run(self.cancel.clone()));

        watcher.run(self.cancel.clone()).await;

        // The watcher also returns when its event stream closes
        self.cancel.cancel();
        if let Err(e) = scheduler_handle.await {
            error!(error = %e, "scheduler task failed");
        }

        info!("service stopped");
        Ok(())
    }

    /// Signal shutdown: stops the watcher and the scheduler
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait up to `timeout` for in-flight jobs. Returns true if all finished.
    ///
    /// Draining stops the service first, so the scheduler promotes no new job
    /// while the tracker is waited on.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.stop();
        self.jobs.close();
        let in_flight = self.jobs.len();
        if in_flight > 0 {
            info!(in_flight, "waiting for running jobs");
        }

        match tokio::time::timeout(timeout, self.jobs.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    remaining = self.jobs.len(),
                    "jobs still running after drain timeout"
                );
                false
            }
        }
    }

    /// The ledger shared by the watcher, the scheduler and the jobs
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// The validated configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

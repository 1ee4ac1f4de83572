//! Tick loop that turns ready ledger entries into running jobs.
//!
//! Every `tick_interval` the scheduler asks the [`Ledger`] to expire stale
//! entries and promote ready ones, then spawns one job task per promoted
//! location. The ledger lock is released before any task is spawned. Jobs are
//! tracked in a [`TaskTracker`] so shutdown can wait for them; the loop itself
//! never awaits a job.
//!
//! # Example
//!
//! ```no_run
//! use autounpack::extraction::FormatDecoder;
//! use autounpack::job::JobRunner;
//! use autounpack::ledger::Ledger;
//! use autounpack::scheduler::Scheduler;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tokio_util::task::TaskTracker;
//!
//! # async fn example() {
//! let ledger = Arc::new(Ledger::new(Duration::from_secs(60), Some(Duration::from_secs(3600))));
//! let runner = JobRunner::new(ledger.clone(), Arc::new(FormatDecoder), None);
//! let scheduler = Scheduler::new(ledger, runner, Duration::from_secs(10), TaskTracker::new());
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(scheduler.run(cancel.clone()));
//! # }
//! ```

use crate::job::JobRunner;
use crate::ledger::Ledger;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};


/// Periodic promoter of ledger entries
pub struct Scheduler {
    ledger: Arc<Ledger>,
    runner: JobRunner,
    tick_interval: Duration,
    tracker: TaskTracker,
}

impl Scheduler {
    /// Create a scheduler. Promoted jobs are spawned on `tracker`.
    pub fn new(
        ledger: Arc<Ledger>,
        runner: JobRunner,
        tick_interval: Duration,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            ledger,
            runner,
            tick_interval,
            tracker,
        }
    }

    /// Run the tick loop until `cancel` fires.
    ///
    /// The first tick happens one interval after start. In-flight jobs are
    /// not cancelled when the loop exits.
    pub async fn run(self, cancel: CancellationToken) {
        info!(tick_interval = ?self.tick_interval, "scheduler started");

        let mut interval =
            tokio::time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                now = interval.tick() => {
                    self.tick(now).await;
                }
            }
        }

        info!("scheduler stopped");
    }

    /// Promote ready jobs at `now` and spawn them. Returns how many were spawned.
    pub async fn tick(&self, now: Instant) -> usize {
        let promoted = self.ledger.scan_and_promote(now).await;
        if promoted.is_empty() {
            return 0;
        }

        debug!(count = promoted.len(), "promoted jobs");
        for job in &promoted {
            info!(location = ?job.location, "starting job");
            let runner = self.runner.clone();
            let location = job.location.clone();
            self.tracker.spawn(async move {
                // Errors are logged by the runner
                let _ = runner.run(&location).await;
            });
        }

        promoted.len()
    }
}

//! Debounce Ledger
//!
//! The ledger maps each tracked location to its [`PendingJob`]. It is the only
//! shared mutable state in the daemon: the Event Ingestor inserts and
//! refreshes entries, the scheduler promotes and expires them, and job tasks
//! remove them when they finish. One [`tokio::sync::Mutex`] guards the whole
//! map and no I/O ever happens while it is held.
//!
//! All operations take `now` explicitly so the timing rules can be tested
//! without sleeping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Scheduling state for one tracked location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingJob {
    /// The path named by the notification that created this job
    pub location: PathBuf,
    /// Earliest instant at which the job may be promoted
    pub ready_at: Instant,
    /// Instant after which an unpromoted job is dropped; `None` never expires
    pub expire_at: Option<Instant>,
    /// Set once by the scheduler when the job is dispatched
    pub running: bool,
}

impl PendingJob {
    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }

    fn is_ready(&self, now: Instant) -> bool {
        now >= self.ready_at
    }
}

/// Shared map from location to pending job
#[derive(Debug)]
pub struct Ledger {
    quiesce_delay: Duration,
    expiry_window: Option<Duration>,
    jobs: Mutex<HashMap<PathBuf, PendingJob>>,
}

impl Ledger {
    /// Create an empty ledger
    ///
    /// `quiesce_delay` is how long a location must stay quiet before it is
    /// promoted; `expiry_window` bounds how long it may wait unpromoted
    /// (`None` disables expiry).
    pub fn new(quiesce_delay: Duration, expiry_window: Option<Duration>) -> Self {
        Self {
            quiesce_delay,
            expiry_window,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn deadlines(&self, now: Instant) -> (Instant, Option<Instant>) {
        (
            now + self.quiesce_delay,
            self.expiry_window.map(|window| now + window),
        )
    }

    /// Start (or restart) tracking `location` after a creation notification.
    ///
    /// Replaces any pending entry for the location with fresh deadlines. If a
    /// job for the location is already running the notification is ignored,
    /// so at most one extraction per location is ever in flight. Returns
    /// whether the location is now scheduled from `now`.
    pub async fn upsert_on_create(&self, location: &Path, now: Instant) -> bool {
        let (ready_at, expire_at) = self.deadlines(now);
        let mut jobs = self.jobs.lock().await;

        if let Some(existing) = jobs.get(location)
            && existing.running
        {
            debug!(?location, "creation while job is running, ignoring");
            return false;
        }

        jobs.insert(
            location.to_path_buf(),
            PendingJob {
                location: location.to_path_buf(),
                ready_at,
                expire_at,
                running: false,
            },
        );
        debug!(?location, tracked = jobs.len(), "tracking location");
        true
    }

    /// Push back the deadlines of a pending (not running) job.
    ///
    /// Writes to untracked or running locations are ignored. Returns whether
    /// a job was refreshed.
    pub async fn refresh_on_write(&self, location: &Path, now: Instant) -> bool {
        let (ready_at, expire_at) = self.deadlines(now);
        let mut jobs = self.jobs.lock().await;

        match jobs.get_mut(location) {
            Some(job) if !job.running => {
                job.ready_at = ready_at;
                job.expire_at = expire_at;
                debug!(?location, "reset quiesce deadline");
                true
            }
            Some(_) => {
                debug!(?location, "write while job is running, ignoring");
                false
            }
            None => false,
        }
    }

    /// Expire stale entries and promote ready ones, in one critical section.
    ///
    /// Unpromoted entries past their expiry are removed. Unpromoted entries
    /// past their ready instant are marked running and returned; the caller
    /// dispatches them after this call has released the lock.
    pub async fn scan_and_promote(&self, now: Instant) -> Vec<PendingJob> {
        let mut jobs = self.jobs.lock().await;
        let mut promoted = Vec::new();

        jobs.retain(|location, job| {
            if job.running {
                return true;
            }
            if job.is_expired(now) {
                info!(?location, "location expired before it was processed");
                return false;
            }
            if job.is_ready(now) {
                job.running = true;
                promoted.push(job.clone());
            }
            true
        });

        promoted
    }

    /// Stop tracking `location`. Returns whether an entry was removed.
    pub async fn complete(&self, location: &Path) -> bool {
        self.jobs.lock().await.remove(location).is_some()
    }

    /// Snapshot of the job for `location`, if tracked
    pub async fn get(&self, location: &Path) -> Option<PendingJob> {
        self.jobs.lock().await.get(location).cloned()
    }

    /// Whether `location` currently has a job
    pub async fn is_tracked(&self, location: &Path) -> bool {
        self.jobs.lock().await.contains_key(location)
    }

    /// Number of tracked locations
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Whether no location is tracked
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

//! Event Ingestor: filesystem notifications into ledger updates
//!
//! Each configured directory is watched non-recursively with `notify`'s
//! recommended backend. Raw events are forwarded over an unbounded channel to
//! [`FolderWatcher::run`], which classifies them:
//! - creation (a new entry, or one renamed into the directory) starts or
//!   restarts tracking via [`Ledger::upsert_on_create`]
//! - writes push back the quiesce deadline via [`Ledger::refresh_on_write`]
//! - everything else is ignored
//!
//! Paths whose final component is `extracted` are our own output and are
//! never tracked. Delivery errors are logged and the loop keeps going.
//!
//! # Example
//!
//! ```no_run
//! use autounpack::folder_watcher::FolderWatcher;
//! use autounpack::ledger::Ledger;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> autounpack::Result<()> {
//! let ledger = Arc::new(Ledger::new(Duration::from_secs(60), None));
//! let mut watcher = FolderWatcher::new(ledger, vec!["/srv/drop".into()])?;
//! watcher.start()?;
//!
//! // Runs until the token is cancelled
//! watcher.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::types::{EXTRACTED_DIR, NotificationKind};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Map a notify event kind onto the notifications the ledger understands
pub fn classify(kind: &EventKind) -> Option<NotificationKind> {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(NotificationKind::Create)
        }
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(NotificationKind::Write),
        _ => None,
    }
}

/// Whether `path` is an `extracted` output directory
fn is_own_output(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == EXTRACTED_DIR)
}

/// Watches directories and feeds the ledger
pub struct FolderWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Ledger updated by incoming events
    ledger: Arc<Ledger>,

    /// Directories to watch
    paths: Vec<PathBuf>,
}

impl FolderWatcher {
    /// Create a new folder watcher
    ///
    /// # Errors
    /// Returns [`Error::NotificationSource`] if the backend cannot be initialized
    pub fn new(ledger: Arc<Ledger>, paths: Vec<PathBuf>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::with_channel(ledger, paths, tx, rx)
    }

    /// Build a watcher whose backend forwards into `tx`
    fn with_channel(
        ledger: Arc<Ledger>,
        paths: Vec<PathBuf>,
        tx: mpsc::UnboundedSender<notify::Result<Event>>,
        rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    ) -> Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("failed to forward filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::NotificationSource(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            ledger,
            paths,
        })
    }

    /// Register every configured directory with the backend
    ///
    /// # Errors
    /// Returns [`Error::NotificationSource`] for the first directory that cannot
    /// be watched (missing, permission denied, watch limit reached)
    pub fn start(&mut self) -> Result<()> {
        for path in &self.paths {
            self.watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    Error::NotificationSource(format!(
                        "failed to watch {}: {}",
                        path.display(),
                        e
                    ))
                })?;

            info!(?path, "watching directory");
        }

        Ok(())
    }

    /// Process events until `cancel` fires or the event stream closes
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("folder watcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.rx.recv() => match received {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => {
                        error!(
                            error = %e,
                            error_code = "notification_source_error",
                            "filesystem watcher error"
                        );
                    }
                    None => break,
                },
            }
        }

        info!("folder watcher stopped");
    }

    /// Apply one filesystem event to the ledger
    async fn handle_event(&self, event: Event) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        let now = Instant::now();
        for path in &event.paths {
            if is_own_output(path) {
                debug!(?path, "ignoring extraction output");
                continue;
            }

            debug!(?path, ?kind, "filesystem event");
            match kind {
                NotificationKind::Create => {
                    self.ledger.upsert_on_create(path, now).await;
                }
                NotificationKind::Write => {
                    self.ledger.refresh_on_write(path, now).await;
                }
            }
        }
    }
}

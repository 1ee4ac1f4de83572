//! Error types for autounpack
//!
//! This module provides the error hierarchy for the daemon:
//! - Configuration errors, which are fatal and abort startup
//! - Notification-source errors, which are logged and never stop the watcher
//! - Per-job errors (traversal, extraction, placement), isolated to one location
//!
//! Each error carries a machine-readable code (see [`Error::error_code`]) that is
//! attached to log records so failures can be grepped and counted.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for autounpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for autounpack
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "watch_paths")
        key: Option<String>,
    },

    /// Filesystem notification source failed (watch registration or delivery)
    #[error("notification source error: {0}")]
    NotificationSource(String),

    /// Walking a directory tree failed
    #[error("failed to walk {path}: {reason}")]
    Traversal {
        /// The path at which the walk failed
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Archive extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Moving or copying extracted content into place failed
    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file suffix is not one of the recognized archive suffixes
    #[error("unsupported archive format: {archive}")]
    UnsupportedFormat {
        /// The file that could not be matched to a decoder
        archive: PathBuf,
    },

    /// Decoder rejected the archive (corrupt, truncated, unreadable, disk full)
    #[error("extraction failed for {archive}: {reason}")]
    Failed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// The blocking extraction task panicked or was cancelled
    #[error("extraction task for {archive} did not complete: {reason}")]
    TaskPanicked {
        /// The archive that was being extracted
        archive: PathBuf,
        /// Join error description
        reason: String,
    },
}

/// Placement errors (atomic move and copy fallback both failed)
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Copying a file to its obfuscated sibling path failed
    #[error("failed to copy {source_path} to {dest_path}: {reason}")]
    CopyFailed {
        /// The file being copied
        source_path: PathBuf,
        /// The temporary destination path
        dest_path: PathBuf,
        /// The reason the copy failed
        reason: String,
    },

    /// Renaming a fully-copied file into its final path failed
    #[error("failed to rename {source_path} to {dest_path}: {reason}")]
    RenameFailed {
        /// The temporary path holding the copied data
        source_path: PathBuf,
        /// The final path
        dest_path: PathBuf,
        /// The reason the rename failed
        reason: String,
    },

    /// A path could not be mapped into the destination tree
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it is invalid
        reason: String,
    },

    /// The blocking copy task panicked or was cancelled
    #[error("copy task did not complete: {0}")]
    TaskPanicked(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error should abort the whole process
    ///
    /// Only configuration errors are fatal; every other error is scoped to a
    /// single notification or a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config { .. })
    }

    /// Machine-readable error code, attached to log records
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NotificationSource(_) => "notification_source_error",
            Error::Traversal { .. } => "traversal_error",
            Error::Extraction(e) => match e {
                ExtractionError::UnsupportedFormat { .. } => "unsupported_format",
                ExtractionError::Failed { .. } => "extraction_failed",
                ExtractionError::TaskPanicked { .. } => "extraction_task_failed",
            },
            Error::Placement(e) => match e {
                PlacementError::CopyFailed { .. } => "copy_failed",
                PlacementError::RenameFailed { .. } => "rename_failed",
                PlacementError::InvalidPath { .. } => "invalid_path",
                PlacementError::TaskPanicked(_) => "copy_task_failed",
            },
            Error::Io(_) => "io_error",
        }
    }
}

//! Core types for autounpack

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the directory that receives extracted content, next to the source.
///
/// Entries with this name are never treated as new work: the ingestor ignores
/// notifications for them and tree walks do not descend into them.
pub const EXTRACTED_DIR: &str = "extracted";

/// Archive type detected by file-name suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    /// RAR archive (.rar)
    Rar,
    /// 7-Zip archive (.7z)
    SevenZip,
    /// TAR archive (.tar)
    Tar,
    /// ZIP archive (.zip)
    Zip,
}

impl ArchiveType {
    /// Recognized suffixes, matched case-sensitively against the file name
    pub const SUFFIXES: [(&'static str, ArchiveType); 4] = [
        (".rar", ArchiveType::Rar),
        (".tar", ArchiveType::Tar),
        (".zip", ArchiveType::Zip),
        (".7z", ArchiveType::SevenZip),
    ];

    /// Detect the archive type from a path's file name.
    ///
    /// Matching is case-sensitive: `movie.ZIP` is not recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.as_encoded_bytes();
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix.as_bytes()))
            .map(|(_, kind)| *kind)
    }

    /// Short human-readable format name used in log records
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Rar => "RAR",
            ArchiveType::SevenZip => "7z",
            ArchiveType::Tar => "TAR",
            ArchiveType::Zip => "ZIP",
        }
    }
}

/// Filesystem notification kinds the daemon reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    /// A new entry appeared in a watched directory
    Create,
    /// An existing entry was written to
    Write,
}

/// Result of running one promoted job to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// No recognized archive was found under the location
    NoArchive,
    /// An archive was unpacked and its content placed at `destination`
    Extracted {
        /// The archive that was unpacked
        archive: PathBuf,
        /// The final `extracted` directory
        destination: PathBuf,
        /// Number of files the decoder reported
        file_count: usize,
    },
}

//! Configuration types for autounpack

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the unpack daemon
///
/// Every field except `watch_paths` has a default, so a JSON config file can be
/// as small as `{"watch_paths": ["/srv/drop"]}`. Durations are written as
/// humantime strings (`"90s"`, `"1m"`, `"1h 30m"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directories to watch (non-recursively) for new entries
    pub watch_paths: Vec<PathBuf>,

    /// Idle time after the last write before a location is processed (default: 1m)
    #[serde(default = "default_quiesce_delay", with = "duration_serde")]
    pub quiesce_delay: Duration,

    /// How often the scheduler scans for ready or expired locations (default: 10s)
    #[serde(default = "default_tick_interval", with = "duration_serde")]
    pub tick_interval: Duration,

    /// Maximum time a location may wait unprocessed before it is dropped
    /// (default: 1h, `None` = never expire)
    #[serde(default = "default_expiry_window", with = "optional_duration_serde")]
    pub expiry_window: Option<Duration>,

    /// Staging root for extraction; must be on the same device as the watched
    /// directories for the atomic move to apply (None = extract in place)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_paths: Vec::new(),
            quiesce_delay: default_quiesce_delay(),
            tick_interval: default_tick_interval(),
            expiry_window: default_expiry_window(),
            staging_dir: None,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                "config",
                format!("failed to read config file {}: {}", path.display(), e),
            )
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::config(
                "config",
                format!("failed to parse config file {}: {}", path.display(), e),
            )
        })
    }

    /// Check the configuration before anything is started
    ///
    /// # Errors
    /// Returns [`Error::Config`] when no watch path is given, a watch path is
    /// missing or not a directory, the tick interval is zero, or the staging
    /// directory is set but unusable.
    pub fn validate(&self) -> Result<()> {
        if self.watch_paths.is_empty() {
            return Err(Error::config("watch_paths", "at least one path is required"));
        }

        for path in &self.watch_paths {
            if !path_exists(path)? {
                return Err(Error::config(
                    "watch_paths",
                    format!("directory {} doesn't exist", path.display()),
                ));
            }
            if !path.is_dir() {
                return Err(Error::config(
                    "watch_paths",
                    format!("{} is not a directory", path.display()),
                ));
            }
        }

        if self.tick_interval.is_zero() {
            return Err(Error::config(
                "tick_interval",
                "tick interval must be greater than zero",
            ));
        }

        if let Some(staging) = &self.staging_dir
            && !staging.is_dir()
        {
            return Err(Error::config(
                "staging_dir",
                format!("staging directory {} doesn't exist", staging.display()),
            ));
        }

        Ok(())
    }
}

/// Split a comma separated list of directories
///
/// Entries are trimmed and empty entries dropped.
///
/// # Errors
/// Returns [`Error::Config`] if the list contains no usable entry.
pub fn parse_watch_paths(raw: &str) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();

    if paths.is_empty() {
        return Err(Error::config("watch_paths", "path required"));
    }
    Ok(paths)
}

/// Check whether a path exists
///
/// Returns `Ok(false)` when the path is absent and an error for any other
/// failure (e.g. permission denied on a parent).
pub fn path_exists(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::config(
            "watch_paths",
            format!("cannot stat {}: {}", path.display(), e),
        )),
    }
}

fn default_quiesce_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_expiry_window() -> Option<Duration> {
    Some(Duration::from_secs(60 * 60))
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

//! Command-line interface
//!
//! Every flag can also be given through the environment variable named in its
//! help text, so the daemon can run from environment variables alone.

use crate::config::{Config, parse_watch_paths};
use crate::error::{Error, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(raw: &str) -> std::result::Result<Duration, humantime::DurationError> {
    humantime::parse_duration(raw)
}

/// Watch directories and unpack archives dropped into them
#[derive(Parser, Debug, Clone)]
#[command(name = "autounpack", version)]
pub struct Cli {
    /// Comma separated list of directories to watch
    #[arg(long, env = "PATHS")]
    pub paths: Option<String>,

    /// Delay to wait after the last write before unpacking
    #[arg(long, env = "WRITE_DELAY", default_value = "1m", value_parser = parse_duration)]
    pub write_delay: Duration,

    /// How often to check for locations that are ready or expired
    #[arg(long, env = "TIMER_TICKER", default_value = "10s", value_parser = parse_duration)]
    pub timer_ticker: Duration,

    /// How long a location may wait before it is dropped unprocessed
    #[arg(long, env = "PATH_EXPIRE_DURATION", default_value = "1h", value_parser = parse_duration)]
    pub max_path_wait: Duration,

    /// Never drop waiting locations
    #[arg(long, env = "NO_EXPIRY", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub no_expiry: bool,

    /// Staging directory for extraction; must be on the same disk as the watched paths
    #[arg(long, env = "TMP_DIR")]
    pub tmp_dir: Option<String>,

    /// Load the whole configuration from a JSON file; other settings are ignored
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(
        long,
        env = "DEBUG",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,
}

impl Cli {
    /// Build and validate the daemon configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] when no watch path is given, the config file
    /// cannot be loaded, or the resulting configuration does not validate.
    pub fn into_config(self) -> Result<Config> {
        let config = match self.config {
            Some(file) => Config::from_json_file(&file)?,
            None => {
                let raw = self
                    .paths
                    .ok_or_else(|| Error::config("watch_paths", "path required"))?;
                Config {
                    watch_paths: parse_watch_paths(&raw)?,
                    quiesce_delay: self.write_delay,
                    tick_interval: self.timer_ticker,
                    expiry_window: (!self.no_expiry).then_some(self.max_path_wait),
                    staging_dir: self
                        .tmp_dir
                        .filter(|dir| !dir.trim().is_empty())
                        .map(PathBuf::from),
                }
            }
        };

        config.validate()?;
        Ok(config)
    }
}

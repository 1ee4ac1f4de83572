//! autounpack daemon
//!
//! Usage:
//!     autounpack --paths /srv/drop,/srv/incoming --write-delay 1m --tmp-dir /srv/.staging

use autounpack::cli::Cli;
use autounpack::logging::init_logging;
use autounpack::{Service, run_with_shutdown};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.debug) {
        eprintln!("failed to initialise logging: {e}");
    }

    let service = match cli.into_config().and_then(Service::new) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, error_code = e.error_code(), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run_with_shutdown(service).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, error_code = e.error_code(), "service failed");
            ExitCode::FAILURE
        }
    }
}

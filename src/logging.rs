//! Log subscriber setup for the daemon binary

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "autounpack=debug"
    } else {
        "autounpack=info"
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`, or by [`default_filter`]
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(debug: bool) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

//! Logging initialization for processes embedding the plugin.
//!
//! The crate itself only emits `tracing` events; installing a subscriber
//! is the host's choice. These helpers give hosts the standard setup
//! without depending on `tracing-subscriber` themselves.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The `RUST_LOG` environment variable wins; otherwise `verbose` selects
/// between `debug` and `info`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use
/// [`try_init_logging`] when that is possible.
pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .init();
}

/// Initializes the global tracing subscriber, leaving any subscriber that
/// is already installed in place.
pub fn try_init_logging(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .try_init();
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

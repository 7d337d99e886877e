//! Subscriber setup.

use tracing_subscriber::EnvFilter;

/// Installs the process-wide subscriber: JSON lines on stdout, filtered by
/// `RUST_LOG` with `info` as the default.
///
/// Repeated calls are no-ops, so tests that bring up the whole app can call
/// this freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}

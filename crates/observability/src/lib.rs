//! `storefront-observability` — shared tracing setup.

/// Wires up tracing for the process. Idempotent.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter + formatter).
pub mod tracing;

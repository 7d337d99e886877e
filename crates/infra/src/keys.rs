//! Cache key scheme.
//!
//! These keys are an external contract shared with tooling and tests:
//! `product:{id}` and `card:{id}` for single entities, `product:all` for the
//! full product list. Entries default to a fixed long lifetime.

use std::time::Duration;

/// Cache key holding the serialized full product list.
pub const PRODUCT_LIST: &str = "product:all";

/// Default cache entry lifetime: 100 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(100 * 60 * 60);

/// Cache key for one product.
pub fn product(id: i64) -> String {
    format!("product:{id}")
}

/// Cache key for one card.
pub fn card(id: i64) -> String {
    format!("card:{id}")
}

//! `storefront-services` — use-case services over the repository.
//!
//! Four small services, one per use case family, mirroring the shape of the
//! system's public operations: creating, listing, searching, updating. Each
//! owns validation of its inputs so invalid requests never reach a backend,
//! and wraps every failure with its own operation label.

pub mod creating;
pub mod listing;
pub mod locks;
pub mod searching;
pub mod updating;

pub use creating::CreatingService;
pub use listing::ListingService;
pub use searching::SearchingService;
pub use updating::UpdatingService;

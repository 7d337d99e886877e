//! `storefront-infra` — backend adapters and the consistency orchestrator.
//!
//! The [`Repository`] coordinates three backends of different authority: the
//! primary store (source of truth), the cache (read accelerator), and the
//! search index (best-effort, rebuildable). Write paths fan out refresh work
//! through the supervised [`propagation`] pool instead of blocking callers.

pub mod backend;
pub mod keys;
pub mod propagation;
pub mod repository;

pub use backend::{CacheStore, PrimaryStore, SearchIndex};
pub use propagation::{DeadLetter, Propagator, PropagatorConfig, PropagatorStats};
pub use repository::Repository;

//! `storefront-core` — shared error model.
//!
//! Every layer of the service reports failures through [`Error`]: a
//! classified kind plus a chain of operation labels leading down to the
//! root cause.

pub mod error;

pub use error::{Error, Kind, Op, Result};

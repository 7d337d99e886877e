//! `storefront-domain` — catalog and cart entities.
//!
//! Pure data/invariant holders: [`Product`] (immutable once created) and
//! [`Card`] with its line items, whose derived total price moves in lockstep
//! with every mutation. No infrastructure concerns live here.

pub mod card;
pub mod product;

pub use card::{Card, CardItem};
pub use product::{Category, Product};

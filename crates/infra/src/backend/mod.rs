//! Backend contracts the repository coordinates.
//!
//! Three narrow capability traits, one per backend. Implementations are
//! injected into [`crate::Repository`] at construction; nothing here is
//! looked up from ambient state.

pub mod in_memory;
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis_cache;
#[cfg(feature = "redis")]
pub mod redisearch;

use std::time::Duration;

use async_trait::async_trait;

use storefront_core::Result;
use storefront_domain::{Card, Product};

/// Durable source of truth for products and cards.
///
/// The only backend whose absence of data is authoritative: a miss here is
/// `NotFound`, not a gap to paper over.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Persist a new product; the store assigns identity and timestamps.
    async fn insert_product(&self, product: Product) -> Result<Product>;

    async fn product_by_id(&self, id: i64) -> Result<Product>;

    async fn product_list(&self) -> Result<Vec<Product>>;

    /// Substring match over titles; the fallback behind the search index.
    async fn search_products_by_title(&self, keywords: &str) -> Result<Vec<Product>>;

    /// Persist a new card; the store assigns identity and timestamps.
    async fn insert_card(&self, card: Card) -> Result<Card>;

    async fn card_by_id(&self, id: i64) -> Result<Card>;

    /// Full replace of the stored card, never a partial patch.
    async fn update_card(&self, card: &Card) -> Result<()>;
}

/// Key/value cache with per-entry expiration.
///
/// Absence is signaled by `None`, never by an error; an `Err` from `get` is
/// a transport failure.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn flush_all(&self) -> Result<()>;
}

/// Keyword index over product titles; secondary and rebuildable from the
/// primary store.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Add or replace the document for one product.
    async fn upsert(&self, product: &Product) -> Result<()>;

    async fn query_by_keywords(&self, keywords: &str) -> Result<Vec<Product>>;
}

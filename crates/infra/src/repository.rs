//! Multi-backend repository.
//!
//! Coordinates three backends with different guarantees. The primary store
//! is authoritative and every write goes there first, synchronously. The
//! cache is a read-through accelerator: a hit is served without consulting
//! the store, a miss reads the store and warms the cache afterwards. The
//! search index is best-effort and rebuildable; it is fed from store truth
//! on insert and on list misses, and reads fall back to the store when it
//! has nothing.
//!
//! Cache and index writes never run on the request path. They are handed to
//! the [`Propagator`] after the store has committed, so a successful call
//! means the store is current while the replicas catch up.

use std::sync::Arc;

use tracing::instrument;

use storefront_core::{Error, Op, Result};
use storefront_domain::{Card, Product};

use crate::backend::{CacheStore, PrimaryStore, SearchIndex};
use crate::keys;
use crate::propagation::{DeadLetter, Propagator, PropagatorStats};

/// Consistency orchestrator over store, cache, and search index.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn PrimaryStore>,
    cache: Arc<dyn CacheStore>,
    search: Arc<dyn SearchIndex>,
    propagator: Propagator,
}

impl Repository {
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        cache: Arc<dyn CacheStore>,
        search: Arc<dyn SearchIndex>,
        propagator: Propagator,
    ) -> Self {
        Self {
            store,
            cache,
            search,
            propagator,
        }
    }

    /// Returns the product, from cache when present.
    pub async fn get_product_by_id(&self, id: i64) -> Result<Product> {
        const OP: Op = "repository.get_product_by_id";

        let key = keys::product(id);
        let cached = self
            .cache
            .get(&key)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        if let Some(bytes) = cached {
            return serde_json::from_slice(&bytes)
                .map_err(|err| Error::unexpected(OP, err.to_string()));
        }

        let product = self
            .store
            .product_by_id(id)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        self.warm(key, "cache.warm_product", &product);
        Ok(product)
    }

    /// Returns all products, from cache when present.
    ///
    /// A miss reads the store, warms the list entry, and re-indexes every
    /// product from the fetched truth so a flushed index heals itself.
    pub async fn get_product_list(&self) -> Result<Vec<Product>> {
        const OP: Op = "repository.get_product_list";

        let cached = self
            .cache
            .get(keys::PRODUCT_LIST)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        if let Some(bytes) = cached {
            return serde_json::from_slice(&bytes)
                .map_err(|err| Error::unexpected(OP, err.to_string()));
        }

        let products = self
            .store
            .product_list()
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        self.warm(
            keys::PRODUCT_LIST.to_string(),
            "cache.warm_product_list",
            &products,
        );
        for product in &products {
            self.index_product(product);
        }
        Ok(products)
    }

    /// Searches the index, falling back to the store when it returns nothing.
    pub async fn search_products_by_title(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "repository.search_products_by_title";

        let hits = self
            .search
            .query_by_keywords(keywords)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        if !hits.is_empty() {
            return Ok(hits);
        }

        self.store
            .search_products_by_title(keywords)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    /// Inserts the product into the store, then propagates to the replicas:
    /// warms its cache entry, invalidates the list entry, indexes it.
    #[instrument(skip(self, product), fields(title = %product.title()), err)]
    pub async fn insert_product(&self, product: Product) -> Result<Product> {
        const OP: Op = "repository.insert_product";

        let stored = self
            .store
            .insert_product(product)
            .await
            .map_err(|err| Error::wrap(OP, err))?;

        self.warm(keys::product(stored.id()), "cache.warm_product", &stored);
        self.invalidate_product_list();
        self.index_product(&stored);
        Ok(stored)
    }

    /// Returns the card, from cache when present.
    pub async fn get_card_by_id(&self, id: i64) -> Result<Card> {
        const OP: Op = "repository.get_card_by_id";

        let key = keys::card(id);
        let cached = self
            .cache
            .get(&key)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        if let Some(bytes) = cached {
            return serde_json::from_slice(&bytes)
                .map_err(|err| Error::unexpected(OP, err.to_string()));
        }

        let card = self
            .store
            .card_by_id(id)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        self.warm(key, "cache.warm_card", &card);
        Ok(card)
    }

    /// Returns the card from the primary store, bypassing the cache.
    ///
    /// Read-modify-write sequences must build on the latest committed state;
    /// a cached entry can lag behind a just-committed update. No warm is
    /// enqueued here since the following [`Repository::update_card`] will
    /// refresh the entry with the mutated value.
    pub async fn get_card_for_update(&self, id: i64) -> Result<Card> {
        const OP: Op = "repository.get_card_for_update";

        self.store
            .card_by_id(id)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    #[instrument(skip(self, card), fields(user_id = %card.user_id()), err)]
    pub async fn insert_card(&self, card: Card) -> Result<Card> {
        const OP: Op = "repository.insert_card";

        let stored = self
            .store
            .insert_card(card)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        self.warm(keys::card(stored.id()), "cache.warm_card", &stored);
        Ok(stored)
    }

    #[instrument(skip(self, card), fields(card_id = card.id()), err)]
    pub async fn update_card(&self, card: &Card) -> Result<()> {
        const OP: Op = "repository.update_card";

        self.store
            .update_card(card)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        self.warm(keys::card(card.id()), "cache.warm_card", card);
        Ok(())
    }

    /// Waits for queued propagation tasks to settle.
    pub async fn quiesce(&self) {
        self.propagator.quiesce().await;
    }

    pub fn propagation_stats(&self) -> PropagatorStats {
        self.propagator.stats()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.propagator.dead_letters()
    }

    /// Serializes and enqueues a cache write. Serialization failures are
    /// logged and skipped; the cache entry simply stays cold.
    fn warm<T: serde::Serialize>(&self, key: String, label: &'static str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache warm skipped, serialization failed");
                return;
            }
        };
        let cache = self.cache.clone();
        self.propagator.enqueue(label, async move {
            cache.set(&key, bytes, keys::DEFAULT_TTL).await
        });
    }

    fn invalidate_product_list(&self) {
        let cache = self.cache.clone();
        self.propagator
            .enqueue("cache.invalidate_product_list", async move {
                cache.delete(keys::PRODUCT_LIST).await
            });
    }

    fn index_product(&self, product: &Product) {
        let search = self.search.clone();
        let product = product.clone();
        self.propagator
            .enqueue("search.index_product", async move {
                search.upsert(&product).await
            });
    }
}

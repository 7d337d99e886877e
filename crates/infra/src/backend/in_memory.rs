//! In-memory backends.
//!
//! Used by tests and the default dev profile. Behavior mirrors the real
//! adapters where the repository can observe it: the store assigns ids and
//! timestamps, the cache honors expiration, and the index matches on title
//! keywords.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use storefront_core::{Error, Op, Result};
use storefront_domain::{Card, Product};

use super::{CacheStore, PrimaryStore, SearchIndex};

/// In-memory primary store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<i64, Product>>,
    cards: RwLock<HashMap<i64, Card>>,
    next_product_id: AtomicI64,
    next_card_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(op: Op) -> Error {
    Error::internal(op, "lock poisoned")
}

#[async_trait]
impl PrimaryStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        const OP: Op = "in_memory_store.insert_product";

        let id = self.next_product_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let stored = Product::from_stored(
            id,
            product.title().to_string(),
            product.description().to_string(),
            product.price(),
            product.category(),
            now,
            now,
        );

        let mut products = self.products.write().map_err(|_| poisoned(OP))?;
        products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn product_by_id(&self, id: i64) -> Result<Product> {
        const OP: Op = "in_memory_store.product_by_id";

        let products = self.products.read().map_err(|_| poisoned(OP))?;
        products
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(OP, format!("product {id} not found")))
    }

    async fn product_list(&self) -> Result<Vec<Product>> {
        const OP: Op = "in_memory_store.product_list";

        let products = self.products.read().map_err(|_| poisoned(OP))?;
        let mut list: Vec<Product> = products.values().cloned().collect();
        list.sort_by_key(Product::id);
        Ok(list)
    }

    async fn search_products_by_title(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "in_memory_store.search_products_by_title";

        let products = self.products.read().map_err(|_| poisoned(OP))?;
        let mut hits: Vec<Product> = products
            .values()
            .filter(|p| p.title().contains(keywords))
            .cloned()
            .collect();
        hits.sort_by_key(Product::id);
        Ok(hits)
    }

    async fn insert_card(&self, card: Card) -> Result<Card> {
        const OP: Op = "in_memory_store.insert_card";

        let id = self.next_card_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let stored = Card::from_stored(
            id,
            card.user_id().to_string(),
            card.items().clone(),
            card.price(),
            now,
            now,
        );

        let mut cards = self.cards.write().map_err(|_| poisoned(OP))?;
        cards.insert(id, stored.clone());
        Ok(stored)
    }

    async fn card_by_id(&self, id: i64) -> Result<Card> {
        const OP: Op = "in_memory_store.card_by_id";

        let cards = self.cards.read().map_err(|_| poisoned(OP))?;
        cards
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(OP, format!("card {id} not found")))
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        const OP: Op = "in_memory_store.update_card";

        let mut cards = self.cards.write().map_err(|_| poisoned(OP))?;
        let existing = cards
            .get(&card.id())
            .ok_or_else(|| Error::not_found(OP, format!("card {} not found", card.id())))?;

        let replaced = Card::from_stored(
            card.id(),
            card.user_id().to_string(),
            card.items().clone(),
            card.price(),
            existing.created_at(),
            Utc::now(),
        );
        cards.insert(card.id(), replaced);
        Ok(())
    }
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory cache with lazy expiration.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        const OP: Op = "in_memory_cache.set";

        let mut entries = self.entries.write().map_err(|_| poisoned(OP))?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        const OP: Op = "in_memory_cache.get";

        let entries = self.entries.read().map_err(|_| poisoned(OP))?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        const OP: Op = "in_memory_cache.delete";

        let mut entries = self.entries.write().map_err(|_| poisoned(OP))?;
        entries.remove(key);
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        const OP: Op = "in_memory_cache.flush_all";

        let mut entries = self.entries.write().map_err(|_| poisoned(OP))?;
        entries.clear();
        Ok(())
    }
}

/// In-memory keyword index.
///
/// Matching is intentionally simple: a document matches when its title
/// contains any whitespace-separated keyword, case-insensitively.
#[derive(Debug, Default)]
pub struct InMemorySearch {
    docs: RwLock<HashMap<i64, Product>>,
}

impl InMemorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents. Test aid.
    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SearchIndex for InMemorySearch {
    async fn upsert(&self, product: &Product) -> Result<()> {
        const OP: Op = "in_memory_search.upsert";

        let mut docs = self.docs.write().map_err(|_| poisoned(OP))?;
        docs.insert(product.id(), product.clone());
        Ok(())
    }

    async fn query_by_keywords(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "in_memory_search.query_by_keywords";

        let terms: Vec<String> = keywords
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let docs = self.docs.read().map_err(|_| poisoned(OP))?;
        let mut hits: Vec<Product> = docs
            .values()
            .filter(|p| {
                let title = p.title().to_lowercase();
                terms.iter().any(|term| title.contains(term))
            })
            .cloned()
            .collect();
        hits.sort_by_key(Product::id);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Kind;
    use storefront_domain::Category;

    fn draft(title: &str) -> Product {
        Product::new(title, "test", 100, Category::Car).unwrap()
    }

    #[tokio::test]
    async fn store_assigns_increasing_ids_and_timestamps() {
        let store = InMemoryStore::new();
        let first = store.insert_product(draft("First")).await.unwrap();
        let second = store.insert_product(draft("Second")).await.unwrap();

        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert!(first.created_at() > chrono::DateTime::UNIX_EPOCH);
        assert!(second.created_at() >= first.created_at());
    }

    #[tokio::test]
    async fn store_misses_are_not_found() {
        let store = InMemoryStore::new();
        let err = store.product_by_id(42).await.unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn update_card_replaces_and_bumps_updated_at() {
        let store = InMemoryStore::new();
        let card = store
            .insert_card(Card::new("user-1").unwrap())
            .await
            .unwrap();
        let product = store.insert_product(draft("Wrench")).await.unwrap();

        let mut mutated = card.clone();
        mutated.add_product(&product, 2).unwrap();
        store.update_card(&mutated).await.unwrap();

        let fetched = store.card_by_id(card.id()).await.unwrap();
        assert_eq!(fetched.price(), 200);
        assert_eq!(fetched.created_at(), card.created_at());
        assert!(fetched.updated_at() >= card.updated_at());
    }

    #[tokio::test]
    async fn cache_expires_entries() {
        let cache = InMemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn search_matches_any_keyword_case_insensitively() {
        let store = InMemoryStore::new();
        let search = InMemorySearch::new();
        let widget = store.insert_product(draft("Red Widget")).await.unwrap();
        let cable = store.insert_product(draft("Power Cable")).await.unwrap();
        search.upsert(&widget).await.unwrap();
        search.upsert(&cable).await.unwrap();

        let hits = search.query_by_keywords("widget").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), widget.id());

        let hits = search.query_by_keywords("red cable").await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}

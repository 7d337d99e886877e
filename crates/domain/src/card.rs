use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Error, Result};

use crate::product::Product;

/// One line item: a product snapshot plus an aggregated quantity.
///
/// The product is a copy taken at add time, not a live reference; it keeps
/// the price the buyer saw even if the catalog price changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardItem {
    count: u32,
    product: Product,
}

impl CardItem {
    fn new(product: Product, count: u32) -> Self {
        Self { count, product }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// This item's contribution to the card total.
    pub fn subtotal(&self) -> u64 {
        (self.count as u64).saturating_mul(self.product.price())
    }
}

/// A shopping card.
///
/// Line items are keyed by the product id rendered as a string (the map is
/// serialized as a JSON object, whose keys are strings). `price` is derived
/// from the items and is updated in the same mutation that touches the map,
/// so the two are never observably inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    id: i64,
    user_id: String,
    items: HashMap<String, CardItem>,
    price: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Card {
    /// Validating constructor for a not-yet-persisted card.
    pub fn new(user_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::invalid_argument("card.new", "user id is empty"));
        }

        Ok(Self {
            id: 0,
            user_id,
            items: HashMap::new(),
            price: 0,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        })
    }

    /// Rehydration constructor for store adapters; not re-validated.
    pub fn from_stored(
        id: i64,
        user_id: String,
        items: HashMap<String, CardItem>,
        price: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            price,
            created_at,
            updated_at,
        }
    }

    /// Add `count` units of `product`.
    ///
    /// An existing line item accumulates; a new one is inserted. Either way
    /// the card price grows by `count x product.price` in the same call.
    pub fn add_product(&mut self, product: &Product, count: u32) -> Result<()> {
        if count == 0 {
            return Err(Error::invalid_argument(
                "card.add_product",
                "count must be at least one",
            ));
        }

        let key = product.id().to_string();
        match self.items.get_mut(&key) {
            Some(item) => item.count = item.count.saturating_add(count),
            None => {
                self.items.insert(key, CardItem::new(product.clone(), count));
            }
        }
        self.price = self
            .price
            .saturating_add((count as u64).saturating_mul(product.price()));
        Ok(())
    }

    /// Remove the whole line item for `product_id`, whatever its quantity.
    /// Absent ids are a no-op.
    pub fn remove_card_item(&mut self, product_id: i64) {
        if let Some(item) = self.items.remove(&product_id.to_string()) {
            self.price = self.price.saturating_sub(item.subtotal());
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn items(&self) -> &HashMap<String, CardItem> {
        &self.items
    }

    /// Line item for a product id, if present.
    pub fn item(&self, product_id: i64) -> Option<&CardItem> {
        self.items.get(&product_id.to_string())
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

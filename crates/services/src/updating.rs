//! Card mutation use cases: add a product, remove a line item.
//!
//! Both operations are a read-modify-write over the whole card with no
//! store-side transaction, so the service serializes them per card id
//! through [`CardLocks`]. The read inside the critical section goes to the
//! primary store, not the cache; building on a lagging cache entry would
//! silently drop a just-committed mutation.

use std::sync::Arc;

use tracing::instrument;

use storefront_core::{Error, Op, Result};
use storefront_infra::Repository;

use crate::locks::CardLocks;

#[derive(Clone)]
pub struct UpdatingService {
    repo: Repository,
    locks: Arc<CardLocks>,
}

impl UpdatingService {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            locks: Arc::new(CardLocks::new()),
        }
    }

    /// Adds `count` units of a product to the card. The product is copied
    /// into the card as it exists right now.
    #[instrument(skip(self), err)]
    pub async fn add_product_to_card(
        &self,
        card_id: i64,
        product_id: i64,
        count: u32,
    ) -> Result<()> {
        const OP: Op = "updating.add_product_to_card";

        if card_id <= 0 {
            return Err(Error::invalid_argument(OP, "card id must be positive"));
        }
        if product_id <= 0 {
            return Err(Error::invalid_argument(OP, "product id must be positive"));
        }
        if count == 0 {
            return Err(Error::invalid_argument(OP, "count must be at least one"));
        }

        let lock = self.locks.lock_for(card_id);
        let _guard = lock.lock().await;

        let mut card = self
            .repo
            .get_card_for_update(card_id)
            .await
            .map_err(|err| Error::wrap(OP, err))?;
        let product = self
            .repo
            .get_product_by_id(product_id)
            .await
            .map_err(|err| Error::wrap(OP, err))?;

        card.add_product(&product, count)
            .map_err(|err| Error::wrap(OP, err))?;

        self.repo
            .update_card(&card)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    /// Removes the whole line item for the product, whatever its quantity.
    /// Removing an id the card does not hold still succeeds.
    #[instrument(skip(self), err)]
    pub async fn remove_product_from_card(&self, card_id: i64, product_id: i64) -> Result<()> {
        const OP: Op = "updating.remove_product_from_card";

        if card_id <= 0 {
            return Err(Error::invalid_argument(OP, "card id must be positive"));
        }
        if product_id <= 0 {
            return Err(Error::invalid_argument(OP, "product id must be positive"));
        }

        let lock = self.locks.lock_for(card_id);
        let _guard = lock.lock().await;

        let mut card = self
            .repo
            .get_card_for_update(card_id)
            .await
            .map_err(|err| Error::wrap(OP, err))?;

        card.remove_card_item(product_id);

        self.repo
            .update_card(&card)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }
}

//! Read use cases: product list, single product, single card.

use storefront_core::{Error, Op, Result};
use storefront_domain::{Card, Product};
use storefront_infra::Repository;

/// Read-only lookups over the repository's cache-accelerated paths.
#[derive(Clone)]
pub struct ListingService {
    repo: Repository,
}

impl ListingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn product_list(&self) -> Result<Vec<Product>> {
        const OP: Op = "listing.product_list";

        self.repo
            .get_product_list()
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    pub async fn product_by_id(&self, id: i64) -> Result<Product> {
        const OP: Op = "listing.product_by_id";

        if id <= 0 {
            return Err(Error::invalid_argument(OP, "product id must be positive"));
        }
        self.repo
            .get_product_by_id(id)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    pub async fn card_by_id(&self, id: i64) -> Result<Card> {
        const OP: Op = "listing.card_by_id";

        if id <= 0 {
            return Err(Error::invalid_argument(OP, "card id must be positive"));
        }
        self.repo
            .get_card_by_id(id)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }
}

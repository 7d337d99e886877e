//! Creation use cases: new products and new cards.

use storefront_core::{Error, Op, Result};
use storefront_domain::{Card, Category, Product};
use storefront_infra::Repository;

/// Creates products and cards.
///
/// Validation happens before the repository is touched: the category string
/// must parse and the entity constructors enforce their field rules, so a
/// rejected request never reaches a backend.
#[derive(Clone)]
pub struct CreatingService {
    repo: Repository,
}

impl CreatingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_product(
        &self,
        title: &str,
        description: &str,
        price: u64,
        category: &str,
    ) -> Result<Product> {
        const OP: Op = "creating.create_product";

        let category = category
            .parse::<Category>()
            .map_err(|err| Error::wrap(OP, err))?;
        let product =
            Product::new(title, description, price, category).map_err(|err| Error::wrap(OP, err))?;

        self.repo
            .insert_product(product)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }

    pub async fn create_card(&self, user_id: &str) -> Result<Card> {
        const OP: Op = "creating.create_card";

        let card = Card::new(user_id).map_err(|err| Error::wrap(OP, err))?;
        self.repo
            .insert_card(card)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_core::Kind;
    use storefront_infra::backend::in_memory::{InMemoryCache, InMemorySearch, InMemoryStore};
    use storefront_infra::{Propagator, PropagatorConfig};

    use super::*;

    fn service() -> CreatingService {
        let repo = Repository::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryCache::new()),
            Arc::new(InMemorySearch::new()),
            Propagator::spawn(PropagatorConfig::default()),
        );
        CreatingService::new(repo)
    }

    #[tokio::test]
    async fn create_product_returns_the_stored_entity() {
        let service = service();
        let product = service
            .create_product("Wrench", "A sturdy wrench", 500, "Car")
            .await
            .unwrap();

        assert_eq!(product.id(), 1);
        assert_eq!(product.category(), Category::Car);
        assert!(product.created_at().timestamp() > 0);
    }

    #[tokio::test]
    async fn create_product_rejects_unknown_category() {
        let service = service();
        let err = service
            .create_product("Wrench", "desc", 500, "Groceries")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::InvalidArgument);
        assert_eq!(err.op(), "creating.create_product");
    }

    #[tokio::test]
    async fn create_product_rejects_blank_title() {
        let service = service();
        let err = service
            .create_product("  ", "desc", 500, "Car")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
    }

    #[tokio::test]
    async fn create_card_starts_empty() {
        let service = service();
        let card = service.create_card("user-1").await.unwrap();

        assert_eq!(card.id(), 1);
        assert_eq!(card.user_id(), "user-1");
        assert!(card.items().is_empty());
        assert_eq!(card.price(), 0);
    }

    #[tokio::test]
    async fn create_card_rejects_blank_user() {
        let service = service();
        let err = service.create_card("").await.unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
        assert_eq!(err.op(), "creating.create_card");
    }
}

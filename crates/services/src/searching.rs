//! Search use case: keyword lookup over product titles.

use storefront_core::{Error, Op, Result};
use storefront_domain::Product;
use storefront_infra::Repository;

#[derive(Clone)]
pub struct SearchingService {
    repo: Repository,
}

impl SearchingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn search_products_by_title(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "searching.search_products_by_title";

        if keywords.trim().is_empty() {
            return Err(Error::invalid_argument(OP, "keywords are empty"));
        }

        self.repo
            .search_products_by_title(keywords)
            .await
            .map_err(|err| Error::wrap(OP, err))
    }
}

use std::sync::Arc;

use storefront_infra::backend::in_memory::{InMemoryCache, InMemorySearch, InMemoryStore};
use storefront_infra::{Propagator, PropagatorConfig, Repository};
use storefront_services::{CreatingService, ListingService, SearchingService, UpdatingService};

#[cfg(feature = "redis")]
use storefront_infra::backend::{
    postgres::PostgresStore,
    redis_cache::RedisCache,
    redisearch::{RediSearchIndex, DEFAULT_INDEX},
};

/// Service bundle handed to every handler through an axum `Extension`.
///
/// All four services share one [`Repository`] clone, so they see the same
/// backends and the same propagation pool.
#[derive(Clone)]
pub struct AppServices {
    pub creating: CreatingService,
    pub listing: ListingService,
    pub searching: SearchingService,
    pub updating: UpdatingService,
    pub repository: Repository,
}

impl AppServices {
    fn from_repository(repository: Repository) -> Self {
        Self {
            creating: CreatingService::new(repository.clone()),
            listing: ListingService::new(repository.clone()),
            searching: SearchingService::new(repository.clone()),
            updating: UpdatingService::new(repository.clone()),
            repository,
        }
    }
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "redis")]
        {
            return build_persistent_services().await;
        }
        #[cfg(not(feature = "redis"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but redis feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services();
        }
    }

    build_in_memory_services()
}

/// In-memory backends (dev/test): everything lives and dies with the process.
pub fn build_in_memory_services() -> AppServices {
    let repository = Repository::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(InMemorySearch::new()),
        Propagator::spawn(PropagatorConfig::default()),
    );
    AppServices::from_repository(repository)
}

#[cfg(feature = "redis")]
async fn build_persistent_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let index = std::env::var("SEARCH_INDEX").unwrap_or_else(|_| DEFAULT_INDEX.to_string());

    let store = PostgresStore::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");
    store
        .ensure_schema()
        .await
        .expect("failed to ensure Postgres schema");

    let cache = RedisCache::connect(&redis_url)
        .await
        .expect("failed to connect to Redis");

    let search = RediSearchIndex::connect(&redis_url, index)
        .await
        .expect("failed to connect to RediSearch");
    search
        .ensure_index()
        .await
        .expect("failed to ensure search index");

    let repository = Repository::new(
        Arc::new(store),
        Arc::new(cache),
        Arc::new(search),
        Propagator::spawn(PropagatorConfig::default()),
    );
    AppServices::from_repository(repository)
}

use axum::Router;

pub mod cards;
pub mod products;
pub mod system;

/// Router for the catalog and cart resources.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/cards", cards::router())
}

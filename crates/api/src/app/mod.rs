//! HTTP application wiring (axum router + backend selection).
//!
//! Layout:
//! - `services.rs`: backend selection and service construction
//! - `routes/`: HTTP routes and handlers, one file per resource
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: error-to-HTTP mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Assembles the full router over freshly wired services.
pub async fn build_app() -> Router {
    let services = Arc::new(services::build_services().await);

    Router::new()
        .route("/healthz", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_card))
        .route("/:id", get(get_card))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:product_id", delete(remove_item))
}

pub async fn create_card(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCardRequest>,
) -> axum::response::Response {
    match services.creating.create_card(&body.user_id).await {
        Ok(card) => (StatusCode::CREATED, Json(dto::card_to_json(&card))).into_response(),
        Err(err) => errors::error_to_response(&err),
    }
}

pub async fn get_card(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: i64 = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "card id must be an integer",
            )
        }
    };
    match services.listing.card_by_id(id).await {
        Ok(card) => (StatusCode::OK, Json(dto::card_to_json(&card))).into_response(),
        Err(err) => errors::error_to_response(&err),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddItemRequest>,
) -> axum::response::Response {
    let card_id: i64 = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "card id must be an integer",
            )
        }
    };
    match services
        .updating
        .add_product_to_card(card_id, body.product_id, body.count)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response(),
        Err(err) => errors::error_to_response(&err),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let card_id: i64 = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "card id must be an integer",
            )
        }
    };
    let product_id: i64 = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "product id must be an integer",
            )
        }
    };
    match services
        .updating
        .remove_product_from_card(card_id, product_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response(),
        Err(err) => errors::error_to_response(&err),
    }
}

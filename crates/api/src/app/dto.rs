use serde::Deserialize;

use storefront_domain::{Card, Product};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub count: u32,
}

/// Query string for `GET /products/search`. A missing `title` falls through
/// as empty and is rejected by the searching service.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id(),
        "title": product.title(),
        "description": product.description(),
        "price": product.price(),
        "category": product.category().as_str(),
        "created_at": product.created_at().to_rfc3339(),
        "updated_at": product.updated_at().to_rfc3339(),
    })
}

pub fn card_to_json(card: &Card) -> serde_json::Value {
    // Items are kept in a map; sort by product id for stable output.
    let mut items = card.items().values().collect::<Vec<_>>();
    items.sort_by_key(|item| item.product().id());

    serde_json::json!({
        "id": card.id(),
        "user_id": card.user_id(),
        "price": card.price(),
        "items": items.into_iter().map(|item| serde_json::json!({
            "product": product_to_json(item.product()),
            "count": item.count(),
            "subtotal": item.subtotal(),
        })).collect::<Vec<_>>(),
        "created_at": card.created_at().to_rfc3339(),
        "updated_at": card.updated_at().to_rfc3339(),
    })
}

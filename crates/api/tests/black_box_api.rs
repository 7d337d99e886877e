use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the app (same router as prod) but bind to an ephemeral port.
        // No env is set, so wiring selects the in-memory backends.
        let app = storefront_api::app::build_app().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    title: &str,
    price: u64,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/products", base_url))
        .json(&json!({
            "title": title,
            "description": "black box fixture",
            "price": price,
            "category": "Car",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_card(client: &reqwest::Client, base_url: &str, user_id: &str) -> serde_json::Value {
    let res = client
        .post(format!("{}/cards", base_url))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

/// Cache refreshes ride the propagation pool, so a read right after a write
/// may serve the previous snapshot. Poll briefly until the card satisfies
/// the predicate.
async fn card_state_eventually(
    client: &reqwest::Client,
    base_url: &str,
    card_id: i64,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..50 {
        let res = client
            .get(format!("{}/cards/{}", base_url, card_id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = res.json().await.unwrap();
        if predicate(&body) {
            return body;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("card {card_id} did not reach the expected state within timeout");
}

async fn product_list_eventually_contains(
    client: &reqwest::Client,
    base_url: &str,
    id: i64,
) -> serde_json::Value {
    // Same story for the list: a cached snapshot is served until the
    // write-side invalidation lands.
    for _ in 0..50 {
        let res = client
            .get(format!("{}/products", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = res.json().await.unwrap();
        if let Some(found) = body
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"].as_i64() == Some(id))
        {
            return found.clone();
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("product {id} did not become visible in the list within timeout");
}

#[tokio::test]
async fn health_reports_propagation_counters() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_product(&client, &srv.base_url, "Health probe", 100).await;

    // Every create fans out at least three background tasks; wait for the
    // pool to drain so the counters are settled.
    for _ in 0..50 {
        let res = client
            .get(format!("{}/healthz", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        if body["propagation"]["pending"].as_u64() == Some(0) {
            assert!(body["propagation"]["enqueued"].as_u64().unwrap() >= 3);
            return;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("propagation pool did not drain within timeout");
}

#[tokio::test]
async fn product_lifecycle_create_get_list() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_product(&client, &srv.base_url, "Hatchback", 250_000).await;
    let id = created["id"].as_i64().unwrap();
    assert!(id >= 1);
    assert_eq!(created["title"], "Hatchback");
    assert_eq!(created["price"], 250_000);
    assert_eq!(created["category"], "Car");

    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["id"].as_i64(), Some(id));
    assert_eq!(fetched["title"], "Hatchback");

    let listed = product_list_eventually_contains(&client, &srv.base_url, id).await;
    assert_eq!(listed["title"], "Hatchback");
}

#[tokio::test]
async fn list_catches_up_after_create() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let first = create_product(&client, &srv.base_url, "First", 100).await;

    // Prime the list cache, then create a second product behind it.
    product_list_eventually_contains(&client, &srv.base_url, first["id"].as_i64().unwrap()).await;
    let second = create_product(&client, &srv.base_url, "Second", 200).await;

    product_list_eventually_contains(&client, &srv.base_url, second["id"].as_i64().unwrap()).await;
}

#[tokio::test]
async fn created_product_is_searchable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_product(&client, &srv.base_url, "Cabriolet roadster", 900_000).await;

    // Search falls back to the primary store while the index write is still
    // in flight, so a fresh product is visible without waiting.
    let res = client
        .get(format!("{}/products/search?title=roadster", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Cabriolet roadster");
}

#[tokio::test]
async fn card_flow_add_and_remove_items() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = create_product(&client, &srv.base_url, "Charger", 1_500).await;
    let product_id = product["id"].as_i64().unwrap();

    let card = create_card(&client, &srv.base_url, "user-7").await;
    let card_id = card["id"].as_i64().unwrap();
    assert_eq!(card["user_id"], "user-7");
    assert_eq!(card["price"], 0);

    let res = client
        .post(format!("{}/cards/{}/items", srv.base_url, card_id))
        .json(&json!({ "product_id": product_id, "count": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let card =
        card_state_eventually(&client, &srv.base_url, card_id, |c| c["price"] == 3_000).await;
    let items = card["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["count"], 2);
    assert_eq!(items[0]["subtotal"], 3_000);
    assert_eq!(items[0]["product"]["id"].as_i64(), Some(product_id));

    let res = client
        .delete(format!(
            "{}/cards/{}/items/{}",
            srv.base_url, card_id, product_id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let card = card_state_eventually(&client, &srv.base_url, card_id, |c| c["price"] == 0).await;
    assert!(card["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_adds_accumulate() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = create_product(&client, &srv.base_url, "Cable", 50).await;
    let product_id = product["id"].as_i64().unwrap();

    let card = create_card(&client, &srv.base_url, "user-9").await;
    let card_id = card["id"].as_i64().unwrap();

    let mut workers = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        let url = format!("{}/cards/{}/items", srv.base_url, card_id);
        workers.push(tokio::spawn(async move {
            let res = client
                .post(url)
                .json(&json!({ "product_id": product_id, "count": 1 }))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    let card = card_state_eventually(&client, &srv.base_url, card_id, |c| c["price"] == 250).await;
    assert_eq!(card["items"][0]["count"], 5);
}

#[tokio::test]
async fn invalid_input_and_missing_resources_map_to_http_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Blank title is rejected before any backend is touched.
    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({
            "title": "",
            "description": "d",
            "price": 10,
            "category": "Car",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_argument");

    // Unknown category.
    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({
            "title": "t",
            "description": "d",
            "price": 10,
            "category": "Spaceship",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Absent product.
    let res = client
        .get(format!("{}/products/99999", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    // Non-numeric path id.
    let res = client
        .get(format!("{}/cards/abc", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Blank card owner.
    let res = client
        .post(format!("{}/cards", srv.base_url))
        .json(&json!({ "user_id": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Search without keywords.
    let res = client
        .get(format!("{}/products/search", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Adding to an absent card.
    let res = client
        .post(format!("{}/cards/777/items", srv.base_url))
        .json(&json!({ "product_id": 1, "count": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adding_an_unknown_product_leaves_the_card_untouched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let card = create_card(&client, &srv.base_url, "user-3").await;
    let card_id = card["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/cards/{}/items", srv.base_url, card_id))
        .json(&json!({ "product_id": 424_242, "count": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/cards/{}", srv.base_url, card_id))
        .send()
        .await
        .unwrap();
    let card: serde_json::Value = res.json().await.unwrap();
    assert!(card["items"].as_array().unwrap().is_empty());
    assert_eq!(card["price"], 0);
}

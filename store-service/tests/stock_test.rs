//! Integration tests for direct stock transactions and the ledger.

mod common;

use common::{TestApp, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn create_product(app: &TestApp, name: &str, quantity: i32) -> i64 {
    let response = app
        .client
        .post(app.url("/api/import"))
        .json(&json!({ "items": [{ "name": name, "unit": "kg", "quantity": quantity, "price": 1000 }] }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("invalid json body");
    body["processed_items"][0]["product_id"].as_i64().unwrap()
}

async fn post_transaction(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let response = app
        .client
        .post(app.url("/api/stock/transaction"))
        .json(&body)
        .send()
        .await
        .expect("request failed");
    let status = response.status();
    let body = response.json().await.expect("invalid json body");
    (status, body)
}

async fn product_stock(app: &TestApp, id: i64) -> i64 {
    let product: Value = app
        .client
        .get(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    product["stock"].as_i64().unwrap()
}

async fn ledger_count_for(app: &TestApp, product_id: i64) -> usize {
    let entries: Vec<Value> = app
        .client
        .get(app.url("/api/stock/transactions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    entries
        .iter()
        .filter(|e| e["product_id"] == product_id)
        .count()
}

#[tokio::test]
async fn import_transaction_adds_stock() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Pepper"), 10).await;

    let (status, body) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "import", "quantity": 5, "note": "restock" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "import");
    assert_eq!(body["new_stock"], 15);
    assert_eq!(product_stock(&app, id).await, 15);
}

#[tokio::test]
async fn export_transaction_subtracts_stock() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Garlic"), 10).await;

    let (status, body) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "export", "quantity": 4 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_stock"], 6);
    assert_eq!(product_stock(&app, id).await, 6);
}

#[tokio::test]
async fn export_beyond_stock_is_rejected_and_stock_unchanged() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Onion"), 3).await;
    let ledger_before = ledger_count_for(&app, id).await;

    let (status, body) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "export", "quantity": 4 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stock"));
    assert_eq!(product_stock(&app, id).await, 3);
    // The rejected operation must not leave a ledger entry either.
    assert_eq!(ledger_count_for(&app, id).await, ledger_before);
}

#[tokio::test]
async fn adjust_leaves_stock_unchanged_but_is_recorded() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Ginger"), 8).await;
    let ledger_before = ledger_count_for(&app, id).await;

    let (status, body) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "adjust", "quantity": 0, "note": "annual stocktake" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_stock"], 8);
    assert_eq!(product_stock(&app, id).await, 8);
    assert_eq!(ledger_count_for(&app, id).await, ledger_before + 1);
}

#[tokio::test]
async fn every_accepted_operation_appends_exactly_one_entry() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Lemongrass"), 10).await;

    // One entry from the creating import.
    assert_eq!(ledger_count_for(&app, id).await, 1);

    for body in [
        json!({ "product_id": id, "type": "import", "quantity": 2 }),
        json!({ "product_id": id, "type": "export", "quantity": 5 }),
        json!({ "product_id": id, "type": "adjust", "quantity": 0, "note": "recount" }),
    ] {
        let (status, _) = post_transaction(&app, body).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(ledger_count_for(&app, id).await, 4);
    assert_eq!(product_stock(&app, id).await, 7);
}

#[tokio::test]
async fn listing_joins_product_name_and_unit() {
    let app = TestApp::spawn().await;
    let name = unique("Cinnamon");
    let id = create_product(&app, &name, 5).await;

    let entries: Vec<Value> = app
        .client
        .get(app.url("/api/stock/transactions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let entry = entries
        .iter()
        .find(|e| e["product_id"] == id)
        .expect("entry not found");
    assert_eq!(entry["product_name"], name.as_str());
    assert_eq!(entry["product_unit"], "kg");
    assert_eq!(entry["type"], "import");
    assert_eq!(entry["quantity"], 5);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = TestApp::spawn().await;
    let id = create_product(&app, &unique("Clove"), 1).await;

    // Unknown type.
    let (status, _) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "transfer", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing product_id.
    let (status, _) = post_transaction(&app, json!({ "type": "import", "quantity": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing quantity.
    let (status, _) = post_transaction(&app, json!({ "product_id": id, "type": "import" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Negative quantity.
    let (status, _) = post_transaction(
        &app,
        json!({ "product_id": id, "type": "import", "quantity": -2 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown product.
    let (status, _) = post_transaction(
        &app,
        json!({ "product_id": 999999999, "type": "import", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

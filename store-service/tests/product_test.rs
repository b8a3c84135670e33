//! Integration tests for product update and deletion.

mod common;

use common::{TestApp, dec, unique};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn create_product(app: &TestApp, name: &str, unit: &str, quantity: i32, price: i64) -> i64 {
    let response = app
        .client
        .post(app.url("/api/import"))
        .json(&json!({ "items": [{ "name": name, "unit": unit, "quantity": quantity, "price": price }] }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("invalid json body");
    body["processed_items"][0]["product_id"].as_i64().unwrap()
}

async fn ledger_entries_for(app: &TestApp, product_id: i64) -> Vec<Value> {
    let entries: Vec<Value> = app
        .client
        .get(app.url("/api/stock/transactions"))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json body");
    entries
        .into_iter()
        .filter(|e| e["product_id"] == product_id)
        .collect()
}

#[tokio::test]
async fn get_unknown_product_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/products/999999999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_products_contains_created_product() {
    let app = TestApp::spawn().await;
    let name = unique("Noodles");
    let id = create_product(&app, &name, "pack", 6, 7000).await;

    let products: Vec<Value> = app
        .client
        .get(app.url("/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let found = products
        .iter()
        .find(|p| p["id"] == id)
        .expect("product missing from listing");
    assert_eq!(found["name"], name.as_str());
    assert_eq!(found["stock"], 6);
}

#[tokio::test]
async fn update_product_reports_changes_and_logs_adjustment() {
    let app = TestApp::spawn().await;
    let name = unique("Oil");
    let id = create_product(&app, &name, "bottle", 7, 5000).await;

    let response = app
        .client
        .put(app.url(&format!("/api/products/{}", id)))
        .json(&json!({ "name": &name, "unit": "bottle", "price": 6000, "stock": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(dec(&body["product"]["price"]), Decimal::from(6000));
    assert_eq!(body["product"]["stock"], 12);
    let changes = body["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);

    let entries = ledger_entries_for(&app, id).await;
    let adjustment = entries
        .iter()
        .find(|e| e["type"] == "adjust")
        .expect("no adjustment entry");
    assert_eq!(adjustment["quantity"], 0);
    assert!(
        adjustment["note"]
            .as_str()
            .unwrap()
            .contains("Product update")
    );
}

#[tokio::test]
async fn update_product_with_no_changes_logs_nothing() {
    let app = TestApp::spawn().await;
    let name = unique("Candles");
    let id = create_product(&app, &name, "box", 3, 1500).await;
    let entries_before = ledger_entries_for(&app, id).await.len();

    let response = app
        .client
        .put(app.url(&format!("/api/products/{}", id)))
        .json(&json!({ "name": &name, "unit": "box", "price": 1500, "stock": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["changes"].as_array().unwrap().is_empty());

    assert_eq!(ledger_entries_for(&app, id).await.len(), entries_before);
}

#[tokio::test]
async fn update_product_validates_fields() {
    let app = TestApp::spawn().await;
    let name = unique("Soap");
    let id = create_product(&app, &name, "bar", 1, 100).await;

    for payload in [
        json!({ "name": "", "unit": "bar", "price": 100, "stock": 1 }),
        json!({ "name": &name, "unit": " ", "price": 100, "stock": 1 }),
        json!({ "name": &name, "unit": "bar", "price": -1, "stock": 1 }),
        json!({ "name": &name, "unit": "bar", "price": 100, "stock": -1 }),
    ] {
        let response = app
            .client
            .put(app.url(&format!("/api/products/{}", id)))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn update_unknown_product_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .put(app.url("/api/products/999999999"))
        .json(&json!({ "name": "Ghost", "unit": "pc", "price": 1, "stock": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unreferenced_product_succeeds_and_keeps_ledger() {
    let app = TestApp::spawn().await;
    let name = unique("Brush");
    let id = create_product(&app, &name, "pc", 4, 900).await;

    let entry_ids: Vec<i64> = ledger_entries_for(&app, id)
        .await
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(entry_ids.len(), 1);

    let response = app
        .client
        .delete(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted_product"]["name"], name.as_str());

    let response = app
        .client
        .get(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Old entries survive with nulled references, plus one deletion marker.
    let entries: Vec<Value> = app
        .client
        .get(app.url("/api/stock/transactions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for entry_id in &entry_ids {
        let survivor = entries
            .iter()
            .find(|e| e["id"] == *entry_id)
            .expect("ledger entry was removed");
        assert!(survivor["product_id"].is_null());
    }
    let marker = entries
        .iter()
        .find(|e| {
            e["type"] == "adjust" && e["note"].as_str().unwrap_or_default().contains(&name)
        })
        .expect("deletion marker not found");
    assert_eq!(marker["quantity"], 0);
}

#[tokio::test]
async fn delete_product_referenced_by_invoice_is_blocked() {
    let app = TestApp::spawn().await;
    let name = unique("Rice premium");
    let id = create_product(&app, &name, "kg", 20, 30000).await;

    let response = app
        .client
        .post(app.url("/api/invoices"))
        .json(&json!({
            "customer_name": unique("Customer"),
            "customer_address": "12 Market Street",
            "items": [{ "name": &name, "unit": "kg", "quantity": 2, "price": 30000 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .client
        .delete(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The product must still be there.
    let response = app
        .client
        .get(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_product_referenced_by_id_is_blocked() {
    let app = TestApp::spawn().await;
    let name = unique("Beans");
    let id = create_product(&app, &name, "kg", 10, 12000).await;

    let response = app
        .client
        .post(app.url("/api/invoices"))
        .json(&json!({
            "customer_name": unique("Customer"),
            "customer_address": "34 Harbor Road",
            "items": [{
                "name": unique("Renamed later"), "unit": "kg",
                "quantity": 1, "price": 12000, "product_id": id,
            }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .client
        .delete(app.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_unknown_product_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .delete(app.url("/api/products/999999999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

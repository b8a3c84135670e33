//! Product handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{Product, UpdateProduct};
use crate::startup::AppState;

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.db.list_products().await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .db
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
    Ok(Json(product))
}

/// Overwrite a product wholesale. The change list is echoed back and recorded
/// as an `adjust` entry in the stock ledger.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.name.trim().is_empty() || payload.unit.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Product name and unit are required"
        )));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Product price cannot be negative"
        )));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Product stock cannot be negative"
        )));
    }

    tracing::info!(product_id = id, name = %payload.name, "Updating product");

    let (product, changes) = state.db.update_product(id, &payload).await?;

    Ok(Json(serde_json::json!({
        "message": "Product updated",
        "product": product,
        "changes": changes,
    })))
}

/// Delete a product unless some invoice still references it.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(product_id = id, "Deleting product");

    let product = state.db.delete_product(id).await?;

    Ok(Json(serde_json::json!({
        "message": "Product deleted",
        "deleted_product": {
            "id": product.id,
            "name": product.name,
            "unit": product.unit,
        },
    })))
}

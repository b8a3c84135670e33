//! Direct stock transaction handlers: the single-operation counterpart of the
//! import batch.

use axum::{Json, extract::State};
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::{StockEntryType, StockTransaction};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct StockTransactionRequest {
    pub product_id: Option<i32>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub quantity: Option<i32>,
    pub note: Option<String>,
}

pub async fn create_stock_transaction(
    State(state): State<AppState>,
    Json(payload): Json<StockTransactionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("product_id is required")))?;
    let entry_type = payload
        .entry_type
        .as_deref()
        .and_then(StockEntryType::from_str)
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "type must be one of import, export or adjust"
            ))
        })?;
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("quantity is required")))?;
    if quantity < 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "quantity cannot be negative"
        )));
    }

    tracing::info!(
        product_id = product_id,
        entry_type = %entry_type,
        quantity = quantity,
        "Applying stock transaction"
    );

    let (product, new_stock) = state
        .db
        .apply_stock_transaction(product_id, entry_type, quantity, payload.note.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "message": format!("Stock {} recorded", entry_type),
        "product_id": product.id,
        "product_name": product.name,
        "type": entry_type,
        "quantity": quantity,
        "new_stock": new_stock,
    })))
}

pub async fn list_stock_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockTransaction>>, AppError> {
    let entries = state.db.list_stock_transactions().await?;
    Ok(Json(entries))
}

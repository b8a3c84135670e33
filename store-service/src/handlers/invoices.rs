//! Invoice handlers.
//!
//! The payload carries either a `customer_id` or the customer's name and
//! address; resolution (and lazy creation) happens inside the database
//! transaction. `total_amount` is accepted on the wire for compatibility but
//! the stored total is always derived from the line items.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

use crate::models::{CustomerRef, Invoice, InvoiceWithCustomer, LineItem};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct InvoicePayload {
    pub date: Option<DateTime<Utc>>,
    pub seller: Option<String>,
    pub customer_id: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "An invoice needs at least one line item"))]
    pub items: Vec<LineItem>,
    #[allow(dead_code)]
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
}

impl InvoicePayload {
    fn customer(&self) -> CustomerRef {
        CustomerRef {
            customer_id: self.customer_id,
            customer_name: self.customer_name.clone(),
            customer_address: self.customer_address.clone(),
            customer_phone: self.customer_phone.clone(),
        }
    }

    fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("pending")
    }
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<InvoicePayload>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    payload.validate()?;

    tracing::info!(items = payload.items.len(), "Creating invoice");

    let invoice = state
        .db
        .create_invoice(
            &payload.customer(),
            &payload.items,
            payload.status(),
            payload.seller.as_deref(),
            payload.date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceWithCustomer>>, AppError> {
    let invoices = state.db.list_invoices().await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<InvoiceWithCustomer>, AppError> {
    let invoice = state
        .db
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(invoice))
}

/// Replace an invoice wholesale. Unlike creation, an empty item list is
/// accepted here; the submitted state is taken as-is.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<InvoicePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(invoice_id = id, items = payload.items.len(), "Updating invoice");

    state
        .db
        .update_invoice(
            id,
            &payload.customer(),
            &payload.items,
            payload.status(),
            payload.seller.as_deref(),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Invoice updated",
    })))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(invoice_id = id, "Deleting invoice");

    state.db.delete_invoice(id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Invoice deleted",
    })))
}

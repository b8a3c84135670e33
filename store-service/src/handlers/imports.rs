//! Batch stock intake: create, merge, rename and delete products in one
//! request, with per-item error reporting.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::{DeletedItem, ImportItem};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<ImportItem>,
    #[serde(default)]
    pub deleted_items: Vec<DeletedItem>,
}

/// Process an import batch. Item-level validation failures are reported in
/// the `errors` array without aborting the rest; the response is 201 either
/// way, with the message flagging partial success.
pub async fn import_batch(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    tracing::info!(
        items = payload.items.len(),
        deleted = payload.deleted_items.len(),
        "Processing import batch"
    );

    let outcome = state
        .db
        .import_batch(&payload.items, &payload.deleted_items)
        .await?;

    let message = if outcome.errors.is_empty() {
        "Batch processed successfully".to_string()
    } else {
        format!("Batch processed with {} errors", outcome.errors.len())
    };

    let mut body = serde_json::json!({
        "message": message,
        "processed_items": outcome.processed,
        "total_processed": outcome.processed.len(),
    });
    if !outcome.errors.is_empty() {
        body["errors"] = serde_json::json!(outcome.errors);
    }

    Ok((StatusCode::CREATED, Json(body)))
}

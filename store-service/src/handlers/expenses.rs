//! Expense handlers. Plain CRUD with a filtered listing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

use crate::models::NewExpense;
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ExpenseBatchRequest {
    #[validate(nested)]
    pub items: Vec<NewExpense>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
}

pub async fn create_expenses(
    State(state): State<AppState>,
    Json(payload): Json<ExpenseBatchRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate()?;

    tracing::info!(items = payload.items.len(), "Recording expenses");

    let inserted = state.db.insert_expenses(&payload.items).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": inserted,
    })))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (expenses, total) = state
        .db
        .list_expenses(filter.from, filter.to, filter.expense_type.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "expenses": expenses,
        "total": total,
    })))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state
        .db
        .delete_expense(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Expense not found")))?;

    tracing::info!(expense_id = id, "Expense deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Expense deleted",
        "deleted": deleted,
    })))
}

//! Read-only dashboard reporting over invoices.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;

use crate::startup::AppState;

/// Dashboard aggregates. Field names stay camelCase for the frontend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_invoices: i64,
    pub revenue: Decimal,
    pub growth: i64,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let (today_invoices, revenue, growth) = state.db.dashboard_stats().await?;

    Ok(Json(DashboardStats {
        today_invoices,
        revenue,
        growth,
    }))
}

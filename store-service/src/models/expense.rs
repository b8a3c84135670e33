//! Expense model. Plain CRUD, no reconciliation involved.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Expense {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
    pub amount: Decimal,
    pub note: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewExpense {
    #[validate(length(min = 1, message = "Expense name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
    pub amount: Decimal,
    pub note: Option<String>,
    pub date: Option<NaiveDate>,
}

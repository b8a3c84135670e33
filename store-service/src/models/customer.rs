//! Customer model and identity resolution input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored customer record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Loosely-identified customer reference as submitted with an invoice.
///
/// Either `customer_id` points at an existing record, or `customer_name` plus
/// `customer_address` identify one, creating it lazily on first sight.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerRef {
    pub customer_id: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
}

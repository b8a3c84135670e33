//! Invoice model with denormalized line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// One invoice line: a frozen snapshot of the product at sale time.
/// Deliberately not a foreign key into `products`; historical invoices must
/// not track later price or name changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i32>,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// The stored `total_amount` is always derived this way; client-supplied
/// totals are ignored.
pub fn invoice_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Stored invoice record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: i32,
    pub invoice_number: String,
    pub customer_id: Option<i32>,
    pub seller: Option<String>,
    pub items: Json<Vec<LineItem>>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice joined with its customer for list and detail responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvoiceWithCustomer {
    pub id: i32,
    pub invoice_number: String,
    pub customer_id: Option<i32>,
    pub seller: Option<String>,
    pub items: Json<Vec<LineItem>>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: i64) -> LineItem {
        LineItem {
            name: "Rice".to_string(),
            unit: "kg".to_string(),
            quantity,
            price: Decimal::from(price),
            product_id: None,
        }
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let items = vec![line(10, 20000), line(3, 5000)];
        assert_eq!(invoice_total(&items), Decimal::from(215000));
    }

    #[test]
    fn empty_invoice_totals_zero() {
        assert_eq!(invoice_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn fractional_prices_keep_exact_cents() {
        let items = vec![LineItem {
            price: "0.10".parse().unwrap(),
            ..line(3, 0)
        }];
        assert_eq!(invoice_total(&items), "0.30".parse::<Decimal>().unwrap());
    }
}

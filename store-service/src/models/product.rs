//! Product model and import-batch item types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored product record. `stock` is authoritative and only ever mutated in
/// the same transaction that appends the matching ledger entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What happened to a product while processing an import item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    Updated,
    Imported,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportAction::Created => "created",
            ImportAction::Updated => "updated",
            ImportAction::Imported => "imported",
        }
    }
}

impl std::fmt::Display for ImportAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of an import batch, as submitted. Fields are optional because
/// violations are collected per item instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportItem {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
    pub product_id: Option<i32>,
    pub operation: Option<String>,
    pub original_name: Option<String>,
    pub original_unit: Option<String>,
}

/// An import item that passed per-item validation.
#[derive(Debug, Clone)]
pub struct ValidImportItem {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub price: Decimal,
    /// True when the client asked to overwrite an existing product wholesale
    /// (`operation: "update"` with the original name/unit attached).
    pub rename: bool,
}

impl ImportItem {
    /// Per-item validation. Returns the error string recorded into the batch
    /// `errors` list; the rest of the batch keeps processing.
    pub fn validated(&self) -> Result<ValidImportItem, String> {
        let name = self.name.as_deref().map(str::trim).unwrap_or("");
        let unit = self.unit.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() || unit.is_empty() {
            return Err(format!(
                "Missing name or unit for product: {}",
                if name.is_empty() { "N/A" } else { name }
            ));
        }

        let quantity = self.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(format!("Invalid quantity for product: {}", name));
        }

        let price = self.price.unwrap_or(Decimal::ZERO);
        if price < Decimal::ZERO {
            return Err(format!("Invalid price for product: {}", name));
        }

        let rename = self.operation.as_deref() == Some("update")
            && self.original_name.is_some()
            && self.original_unit.is_some();

        Ok(ValidImportItem {
            name: name.to_string(),
            unit: unit.to_string(),
            quantity,
            price,
            rename,
        })
    }
}

/// Per-item outcome reported back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedItem {
    pub product_id: i32,
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub new_stock: i32,
    pub price: Decimal,
    pub action: ImportAction,
}

/// Deletion request inside an import batch.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedItem {
    pub product_id: Option<i32>,
}

/// Collected result of a whole import batch: partial success by design.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: Vec<ProcessedItem>,
    pub errors: Vec<String>,
}

/// Wholesale product overwrite (rename, reprice, restock).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub stock: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, quantity: i32, price: i64) -> ImportItem {
        ImportItem {
            name: Some(name.to_string()),
            unit: Some(unit.to_string()),
            quantity: Some(quantity),
            price: Some(Decimal::from(price)),
            ..Default::default()
        }
    }

    #[test]
    fn validated_trims_name_and_unit() {
        let valid = item("  Rice ", " kg ", 10, 20000).validated().unwrap();
        assert_eq!(valid.name, "Rice");
        assert_eq!(valid.unit, "kg");
        assert_eq!(valid.quantity, 10);
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = item("", "kg", 1, 1).validated().unwrap_err();
        assert!(err.contains("N/A"));

        let err = ImportItem::default().validated().unwrap_err();
        assert!(err.contains("Missing name or unit"));
    }

    #[test]
    fn whitespace_only_unit_is_rejected() {
        assert!(item("Rice", "   ", 1, 1).validated().is_err());
    }

    #[test]
    fn negative_quantity_and_price_are_rejected() {
        assert!(item("Rice", "kg", -1, 1).validated().is_err());
        assert!(item("Rice", "kg", 1, -1).validated().is_err());
    }

    #[test]
    fn quantity_and_price_default_to_zero() {
        let valid = ImportItem {
            name: Some("Rice".to_string()),
            unit: Some("kg".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(valid.quantity, 0);
        assert_eq!(valid.price, Decimal::ZERO);
    }

    #[test]
    fn rename_requires_operation_and_originals() {
        let mut it = item("Rice", "kg", 5, 100);
        it.operation = Some("update".to_string());
        assert!(!it.validated().unwrap().rename);

        it.original_name = Some("Ric".to_string());
        it.original_unit = Some("kg".to_string());
        assert!(it.validated().unwrap().rename);
    }
}

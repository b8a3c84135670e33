//! Stock ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of stock-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockEntryType {
    Import,
    Export,
    Adjust,
}

impl StockEntryType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockEntryType::Import => "import",
            StockEntryType::Export => "export",
            StockEntryType::Adjust => "adjust",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "import" => Some(StockEntryType::Import),
            "export" => Some(StockEntryType::Export),
            "adjust" => Some(StockEntryType::Adjust),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger entry joined with its product (null once the product is deleted).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockTransaction {
    pub id: i32,
    pub product_id: Option<i32>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub entry_type: String,
    pub quantity: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_name: Option<String>,
    pub product_unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_round_trips_through_str() {
        for t in [
            StockEntryType::Import,
            StockEntryType::Export,
            StockEntryType::Adjust,
        ] {
            assert_eq!(StockEntryType::from_str(t.as_str()), Some(t));
        }
    }

    #[test]
    fn unknown_entry_type_is_rejected() {
        assert_eq!(StockEntryType::from_str("transfer"), None);
        assert_eq!(StockEntryType::from_str(""), None);
        assert_eq!(StockEntryType::from_str("Import"), None);
    }
}

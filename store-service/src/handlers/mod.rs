//! HTTP handlers for store-service.

pub mod expenses;
pub mod imports;
pub mod invoices;
pub mod products;
pub mod reports;
pub mod stock;

//! Domain models for store-service.

mod customer;
mod expense;
mod invoice;
mod product;
mod stock;

pub use customer::{Customer, CustomerRef};
pub use expense::{Expense, NewExpense};
pub use invoice::{Invoice, InvoiceWithCustomer, LineItem, invoice_total};
pub use product::{
    BatchOutcome, DeletedItem, ImportAction, ImportItem, ProcessedItem, Product, UpdateProduct,
    ValidImportItem,
};
pub use stock::{StockEntryType, StockTransaction};

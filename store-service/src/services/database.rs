//! Database service for store-service.
//!
//! All SQL lives here. The reconciliation paths (customer resolution, product
//! resolution, stock mutation) run inside explicit transactions; the
//! transaction guard rolls back on drop, so every early return leaves the
//! database untouched.

use crate::models::{
    BatchOutcome, Customer, CustomerRef, DeletedItem, Expense, ImportAction, ImportItem, Invoice,
    InvoiceWithCustomer, LineItem, NewExpense, ProcessedItem, Product, StockEntryType,
    StockTransaction, UpdateProduct, ValidImportItem, invoice_total,
};
use crate::services::metrics::{
    DB_QUERY_DURATION, record_import_batch, record_invoice_operation, record_stock_movement,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use service_core::error::AppError;
use sqlx::PgConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{info, instrument};

const PRODUCT_COLUMNS: &str = "id, name, unit, price, stock, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "store-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Resolution
    // -------------------------------------------------------------------------

    /// Resolve a loosely-identified customer to an id, creating the record on
    /// first sight of a (name, address) pair.
    ///
    /// Runs on the caller's transaction. The find-or-create is a single upsert
    /// against the UNIQUE (name, address) constraint, so two concurrent
    /// submissions of the same new pair converge on one row. A non-empty phone
    /// overwrites the stored one (last write wins); an absent or empty phone
    /// leaves it alone. The explicit-id path never touches the phone.
    pub(crate) async fn resolve_customer(
        conn: &mut PgConnection,
        who: &CustomerRef,
    ) -> Result<i32, AppError> {
        if let Some(id) = who.customer_id {
            let found = sqlx::query_scalar::<_, i32>("SELECT id FROM customers WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to look up customer: {}", e))
                })?;
            return found
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} does not exist", id)));
        }

        let name = who
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let address = who
            .customer_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let (Some(name), Some(address)) = (name, address) else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Customer name and address are required"
            )));
        };
        let phone = who
            .customer_phone
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO customers (name, address, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, address)
            DO UPDATE SET phone = COALESCE($3, customers.phone)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(phone)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to resolve customer: {}", e))
        })?;

        Ok(id)
    }

    /// Get a customer by id.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i32) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, name, address, phone, created_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))
    }

    // -------------------------------------------------------------------------
    // Stock Ledger
    // -------------------------------------------------------------------------

    /// Append one ledger entry. The ledger is append-only: nothing in this
    /// service ever updates or deletes a row here.
    async fn append_ledger(
        conn: &mut PgConnection,
        product_id: i32,
        entry_type: StockEntryType,
        quantity: i32,
        note: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO stock_transactions (product_id, type, quantity, note) VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(entry_type.as_str())
        .bind(quantity)
        .bind(note)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to append ledger entry: {}", e))
        })?;

        record_stock_movement(entry_type.as_str());
        Ok(())
    }

    /// List the stock ledger joined with product names, newest first.
    /// Entries for deleted products come back with null product fields.
    #[instrument(skip(self))]
    pub async fn list_stock_transactions(&self) -> Result<Vec<StockTransaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_stock_transactions"])
            .start_timer();

        let entries = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT t.id, t.product_id, t.type, t.quantity, t.note, t.created_at,
                   p.name AS product_name, p.unit AS product_unit
            FROM stock_transactions t
            LEFT JOIN products p ON t.product_id = p.id
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list stock ledger: {}", e))
        })?;

        timer.observe_duration();

        Ok(entries)
    }

    /// Apply a single stock transaction: import adds, export subtracts (and is
    /// the one place negative stock is actively rejected), adjust records a
    /// metadata-only event. Stock update and ledger append commit together.
    /// Returns the product as it was before the mutation plus the new stock.
    #[instrument(skip(self, note), fields(product_id = product_id, entry_type = %entry_type))]
    pub async fn apply_stock_transaction(
        &self,
        product_id: i32,
        entry_type: StockEntryType,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<(Product, i32), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_stock_transaction"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

        let new_stock = match entry_type {
            StockEntryType::Import => product.stock + quantity,
            StockEntryType::Export => {
                if quantity > product.stock {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Cannot export {} {}: only {} in stock for {}",
                        quantity,
                        product.unit,
                        product.stock,
                        product.name
                    )));
                }
                product.stock - quantity
            }
            StockEntryType::Adjust => product.stock,
        };

        if new_stock != product.stock {
            sqlx::query("UPDATE products SET stock = $1, updated_at = NOW() WHERE id = $2")
                .bind(new_stock)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to update stock: {}", e))
                })?;
        }

        let note = note
            .map(str::to_string)
            .unwrap_or_else(|| format!("Stock {}: {} {}", entry_type, quantity, product.unit));
        Self::append_ledger(&mut tx, product_id, entry_type, quantity, &note).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            product_id = product_id,
            entry_type = %entry_type,
            quantity = quantity,
            new_stock = new_stock,
            "Stock transaction applied"
        );

        Ok((product, new_stock))
    }

    // -------------------------------------------------------------------------
    // Product Resolution & Import Batches
    // -------------------------------------------------------------------------

    /// Resolve one validated import item against the product table.
    ///
    /// Lookup is case-insensitive on (name, unit) and locks the matched row.
    /// Three outcomes: create a new product, overwrite one wholesale (the
    /// rename path), or merge quantity into existing stock with the price
    /// taking the latest value. A ledger `import` entry is appended whenever
    /// quantity was actually received.
    async fn resolve_import_item(
        conn: &mut PgConnection,
        item: &ValidImportItem,
    ) -> Result<ProcessedItem, AppError> {
        let existing = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE LOWER(name) = LOWER($1) AND LOWER(unit) = LOWER($2) FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(&item.name)
        .bind(&item.unit)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up product: {}", e)))?;

        let (product_id, new_stock, action) = match existing {
            None => {
                let id = sqlx::query_scalar::<_, i32>(
                    "INSERT INTO products (name, unit, price, stock) VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(&item.name)
                .bind(&item.unit)
                .bind(item.price)
                .bind(item.quantity)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e))
                })?;
                (id, item.quantity, ImportAction::Created)
            }
            Some(product) if item.rename => {
                sqlx::query(
                    "UPDATE products SET name = $1, unit = $2, price = $3, stock = $4, updated_at = NOW() WHERE id = $5",
                )
                .bind(&item.name)
                .bind(&item.unit)
                .bind(item.price)
                .bind(item.quantity)
                .bind(product.id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e))
                })?;
                (product.id, item.quantity, ImportAction::Updated)
            }
            Some(product) => {
                let merged = product.stock + item.quantity;
                sqlx::query(
                    "UPDATE products SET stock = $1, price = $2, updated_at = NOW() WHERE id = $3",
                )
                .bind(merged)
                .bind(item.price)
                .bind(product.id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to update stock: {}", e))
                })?;
                (product.id, merged, ImportAction::Imported)
            }
        };

        if item.quantity > 0 {
            let note = format!(
                "Stock intake - price: {} - {}",
                item.price,
                match action {
                    ImportAction::Created => "new product",
                    _ => "existing product",
                }
            );
            Self::append_ledger(conn, product_id, StockEntryType::Import, item.quantity, &note)
                .await?;
        }

        Ok(ProcessedItem {
            product_id,
            name: item.name.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            new_stock,
            price: item.price,
            action,
        })
    }

    /// Process an import batch in a single transaction: deletions first, then
    /// item resolution. Item validation failures and missing delete targets
    /// are recorded into the error list and the batch keeps going; any
    /// database failure aborts and rolls back everything.
    #[instrument(skip(self, items, deleted_items), fields(items = items.len(), deleted = deleted_items.len()))]
    pub async fn import_batch(
        &self,
        items: &[ImportItem],
        deleted_items: &[DeletedItem],
    ) -> Result<BatchOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["import_batch"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut outcome = BatchOutcome::default();

        for deleted in deleted_items {
            let Some(product_id) = deleted.product_id else {
                continue;
            };

            let product = sqlx::query_as::<_, Product>(&format!(
                "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
                PRODUCT_COLUMNS
            ))
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to look up product: {}", e))
            })?;

            let Some(product) = product else {
                outcome
                    .errors
                    .push(format!("No product with id {} to delete", product_id));
                continue;
            };

            // The deletion marker goes in first; the delete then nulls its
            // product reference via ON DELETE SET NULL, keeping the trail.
            let note = format!("Deleted product: {} - {}", product.name, product.unit);
            Self::append_ledger(&mut tx, product_id, StockEntryType::Adjust, 0, &note).await?;

            sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e))
                })?;
        }

        for item in items {
            match item.validated() {
                Err(message) => outcome.errors.push(message),
                Ok(valid) => {
                    let processed = Self::resolve_import_item(&mut tx, &valid).await?;
                    outcome.processed.push(processed);
                }
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_import_batch(if outcome.errors.is_empty() {
            "ok"
        } else {
            "partial"
        });

        info!(
            processed = outcome.processed.len(),
            errors = outcome.errors.len(),
            "Import batch committed"
        );

        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Product Operations
    // -------------------------------------------------------------------------

    /// List all products, newest first.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY id DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Get a product by id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))
    }

    /// Overwrite a product wholesale and record what changed as a
    /// zero-quantity `adjust` ledger entry. Returns the updated row and the
    /// human-readable change list.
    #[instrument(skip(self, input), fields(product_id = id))]
    pub async fn update_product(
        &self,
        id: i32,
        input: &UpdateProduct,
    ) -> Result<(Product, Vec<String>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let old = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

        let updated = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $1, unit = $2, price = $3, stock = $4, updated_at = NOW() WHERE id = $5 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.price)
        .bind(input.stock)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)))?;

        let mut changes = Vec::new();
        if old.name != updated.name {
            changes.push(format!("name: {} -> {}", old.name, updated.name));
        }
        if old.unit != updated.unit {
            changes.push(format!("unit: {} -> {}", old.unit, updated.unit));
        }
        if old.price != updated.price {
            changes.push(format!("price: {} -> {}", old.price, updated.price));
        }
        if old.stock != updated.stock {
            changes.push(format!("stock: {} -> {}", old.stock, updated.stock));
        }

        if !changes.is_empty() {
            let note = format!("Product update: {}", changes.join(", "));
            Self::append_ledger(&mut tx, id, StockEntryType::Adjust, 0, &note).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(product_id = id, changes = changes.len(), "Product updated");

        Ok((updated, changes))
    }

    /// Delete a product unless it appears on any invoice, by id or by name.
    /// Invoice items are a denormalized snapshot, so this is a JSONB
    /// containment check rather than a foreign key.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn delete_product(&self, id: i32) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

        let by_id = serde_json::json!([{ "product_id": id }]);
        let by_name = serde_json::json!([{ "name": product.name }]);
        let referenced: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE items @> $1 OR items @> $2",
        )
        .bind(&by_id)
        .bind(&by_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check invoice references: {}", e))
        })?;

        if referenced > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete a product that appears on an invoice"
            )));
        }

        let note = format!("Deleted product: {} - {}", product.name, product.unit);
        Self::append_ledger(&mut tx, id, StockEntryType::Adjust, 0, &note).await?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(product_id = id, name = %product.name, "Product deleted");

        Ok(product)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Create an invoice: resolve the customer, derive the total from the
    /// line items, and take the next number from the invoice sequence. All in
    /// one transaction.
    #[instrument(skip(self, customer, items), fields(items = items.len()))]
    pub async fn create_invoice(
        &self,
        customer: &CustomerRef,
        items: &[LineItem],
        status: &str,
        seller: Option<&str>,
        date: Option<DateTime<Utc>>,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let customer_id = Self::resolve_customer(&mut tx, customer).await?;
        let total = invoice_total(items);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (invoice_number, customer_id, seller, items, total_amount, status, created_at)
            VALUES ('INV-' || nextval('invoice_number_seq'), $1, $2, $3, $4, $5, COALESCE($6::timestamptz, NOW()))
            RETURNING id, invoice_number, customer_id, seller, items, total_amount, status, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(seller)
        .bind(Json(items))
        .bind(total)
        .bind(status)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_invoice_operation("create");

        info!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            customer_id = customer_id,
            total = %invoice.total_amount,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Replace an invoice wholesale. The submitted customer fields are
    /// authoritative: a changed (name, address) resolves to (or creates) a
    /// different customer rather than editing the old one.
    #[instrument(skip(self, customer, items), fields(invoice_id = id))]
    pub async fn update_invoice(
        &self,
        id: i32,
        customer: &CustomerRef,
        items: &[LineItem],
        status: &str,
        seller: Option<&str>,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let customer_id = Self::resolve_customer(&mut tx, customer).await?;
        let total = invoice_total(items);

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $1, items = $2, total_amount = $3, status = $4, seller = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(customer_id)
        .bind(Json(items))
        .bind(total)
        .bind(status)
        .bind(seller)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_invoice_operation("update");

        info!(invoice_id = id, customer_id = customer_id, "Invoice updated");

        Ok(())
    }

    /// Delete an invoice by id. Unconditional, and deliberately without any
    /// stock reversal: line items were never linked back to live products.
    #[instrument(skip(self), fields(invoice_id = id))]
    pub async fn delete_invoice(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        record_invoice_operation("delete");

        info!(invoice_id = id, "Invoice deleted");

        Ok(())
    }

    /// List invoices joined with customer fields, newest first.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceWithCustomer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, InvoiceWithCustomer>(
            r#"
            SELECT i.id, i.invoice_number, i.customer_id, i.seller, i.items, i.total_amount,
                   i.status, i.created_at, i.updated_at,
                   c.name AS customer_name, c.address AS customer_address, c.phone AS customer_phone
            FROM invoices i
            LEFT JOIN customers c ON i.customer_id = c.id
            ORDER BY i.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Get one invoice joined with its customer.
    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: i32) -> Result<Option<InvoiceWithCustomer>, AppError> {
        sqlx::query_as::<_, InvoiceWithCustomer>(
            r#"
            SELECT i.id, i.invoice_number, i.customer_id, i.seller, i.items, i.total_amount,
                   i.status, i.created_at, i.updated_at,
                   c.name AS customer_name, c.address AS customer_address, c.phone AS customer_phone
            FROM invoices i
            LEFT JOIN customers c ON i.customer_id = c.id
            WHERE i.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))
    }

    // -------------------------------------------------------------------------
    // Expense Operations
    // -------------------------------------------------------------------------

    /// Insert a batch of expenses in one transaction and return the rows.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn insert_expenses(&self, items: &[NewExpense]) -> Result<Vec<Expense>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_expenses"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let expense = sqlx::query_as::<_, Expense>(
                r#"
                INSERT INTO expenses (name, type, amount, note, date)
                VALUES ($1, $2, $3, $4, COALESCE($5::date, CURRENT_DATE))
                RETURNING id, name, type, amount, note, date
                "#,
            )
            .bind(&item.name)
            .bind(&item.expense_type)
            .bind(item.amount)
            .bind(&item.note)
            .bind(item.date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert expense: {}", e))
            })?;
            inserted.push(expense);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(count = inserted.len(), "Expenses recorded");

        Ok(inserted)
    }

    /// List expenses with optional date range and type filters, newest first.
    /// Also returns the sum over the filtered rows.
    #[instrument(skip(self))]
    pub async fn list_expenses(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        expense_type: Option<&str>,
    ) -> Result<(Vec<Expense>, Decimal), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_expenses"])
            .start_timer();

        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, name, type, amount, note, date
            FROM expenses
            WHERE ($1::date IS NULL OR date >= $1)
              AND ($2::date IS NULL OR date <= $2)
              AND ($3::varchar IS NULL OR type ILIKE $3)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(expense_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list expenses: {}", e)))?;

        let total = expenses.iter().map(|e| e.amount).sum();

        timer.observe_duration();

        Ok((expenses, total))
    }

    /// Delete one expense, returning it, or None if it never existed.
    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: i32) -> Result<Option<Expense>, AppError> {
        sqlx::query_as::<_, Expense>(
            "DELETE FROM expenses WHERE id = $1 RETURNING id, name, type, amount, note, date",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete expense: {}", e)))
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// Dashboard aggregates: today's invoice count, all-time completed
    /// revenue, and month-over-month revenue growth in percent.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<(i64, Decimal, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["dashboard_stats"])
            .start_timer();

        let today_invoices: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE created_at::date = CURRENT_DATE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e)))?;

        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM invoices WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum revenue: {}", e)))?;

        let (current_month, previous_month): (Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total_amount) FILTER (
                    WHERE date_trunc('month', created_at) = date_trunc('month', NOW())), 0),
                COALESCE(SUM(total_amount) FILTER (
                    WHERE date_trunc('month', created_at) = date_trunc('month', NOW() - INTERVAL '1 month')), 0)
            FROM invoices
            WHERE status = 'completed'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to compute growth: {}", e))
        })?;

        let growth = if previous_month > Decimal::ZERO {
            ((current_month - previous_month) / previous_month * Decimal::from(100))
                .round()
                .to_i64()
                .unwrap_or(0)
        } else {
            0
        };

        timer.observe_duration();

        Ok((today_invoices, revenue, growth))
    }
}

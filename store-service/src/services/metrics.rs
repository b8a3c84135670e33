//! Prometheus metrics for store-service.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, HistogramVec, TextEncoder, register_counter_vec, register_histogram_vec,
};

/// Histogram for database query duration by operation.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "store_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Counter for import batches by outcome.
pub static IMPORT_BATCHES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "store_import_batches_total",
        "Total number of import batches processed",
        &["status"]
    )
    .expect("Failed to register IMPORT_BATCHES")
});

/// Counter for stock ledger entries by type.
pub static STOCK_MOVEMENTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "store_stock_movements_total",
        "Total number of stock ledger entries appended",
        &["type"]
    )
    .expect("Failed to register STOCK_MOVEMENTS")
});

/// Counter for invoice operations.
pub static INVOICE_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "store_invoice_operations_total",
        "Total number of invoice operations",
        &["operation"]
    )
    .expect("Failed to register INVOICE_OPERATIONS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&IMPORT_BATCHES);
    Lazy::force(&STOCK_MOVEMENTS);
    Lazy::force(&INVOICE_OPERATIONS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a processed import batch.
pub fn record_import_batch(status: &str) {
    IMPORT_BATCHES.with_label_values(&[status]).inc();
}

/// Record an appended stock ledger entry.
pub fn record_stock_movement(entry_type: &str) {
    STOCK_MOVEMENTS.with_label_values(&[entry_type]).inc();
}

/// Record an invoice operation.
pub fn record_invoice_operation(operation: &str) {
    INVOICE_OPERATIONS.with_label_values(&[operation]).inc();
}

//! Prometheus metrics for timebill-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "timebill_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Invoice counter by status at creation.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "timebill_invoices_total",
        "Total number of invoices created by status",
        &["status"]
    )
    .expect("Failed to register invoices_total")
});

/// Time entries marked billed.
pub static TIME_ENTRIES_BILLED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "timebill_time_entries_billed_total",
        "Total number of time entries marked billed"
    )
    .expect("Failed to register time_entries_billed_total")
});

/// Invoices created whose billing mark did not fully succeed.
pub static BILLING_PARTIAL_FAILURES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "timebill_billing_partial_failures_total",
        "Total number of invoices created with an incomplete billing mark"
    )
    .expect("Failed to register billing_partial_failures_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&TIME_ENTRIES_BILLED_TOTAL);
    Lazy::force(&BILLING_PARTIAL_FAILURES_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

//! Prometheus metrics for invoice-ledger-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// HTTP request counter by method, route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by method and route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "ledger_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_request_duration")
});

/// Invoices created, by initial status.
pub static INVOICES_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_invoices_created_total",
        "Total number of invoices created by initial status",
        &["status"] // draft, pending
    )
    .expect("Failed to register invoices_created_total")
});

/// Status transition attempts.
pub static STATUS_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_status_transitions_total",
        "Total number of invoice status transitions",
        &["from", "to", "result"]
    )
    .expect("Failed to register status_transitions_total")
});

/// Settlement transactions by payment method.
pub static TRANSACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_transactions_total",
        "Total number of settlement transactions by payment method",
        &["payment_method"]
    )
    .expect("Failed to register transactions_total")
});

/// Settled amount by currency.
pub static PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_payment_amount_total",
        "Total settled amount by currency",
        &["currency"]
    )
    .expect("Failed to register payment_amount_total")
});

/// Supply-chain events by event type.
pub static SUPPLY_CHAIN_EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_supply_chain_events_total",
        "Total number of supply-chain events by type",
        &["event_type"]
    )
    .expect("Failed to register supply_chain_events_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ledger_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Store operation duration histogram.
pub static STORE_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "ledger_store_operation_duration_seconds",
        "Ledger store operation duration in seconds",
        &["operation"],
        vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]
    )
    .expect("Failed to register store_operation_duration")
});

/// Payment methods reported under their own label; anything else is `other`.
const PAYMENT_METHOD_LABELS: &[&str] = &["mobile_money", "bank_transfer", "cash", "card"];

const CURRENCY_LABELS: &[&str] = &["ZMW", "USD", "EUR", "GBP", "ZAR", "KES"];

const EVENT_TYPE_LABELS: &[&str] = &[
    "harvest",
    "storage",
    "processing",
    "quality_check",
    "transport",
    "delivery",
    "sale",
];

/// Label values taken from request bodies are folded into a fixed set so
/// clients cannot grow the registry.
fn bounded(value: &str, known: &[&'static str]) -> &'static str {
    let value = value.trim();
    known
        .iter()
        .copied()
        .find(|label| label.eq_ignore_ascii_case(value))
        .unwrap_or("other")
}

pub fn payment_method_label(method: &str) -> &'static str {
    bounded(method, PAYMENT_METHOD_LABELS)
}

pub fn currency_label(currency: &str) -> &'static str {
    bounded(currency, CURRENCY_LABELS)
}

pub fn event_type_label(event_type: &str) -> &'static str {
    bounded(event_type, EVENT_TYPE_LABELS)
}

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&INVOICES_CREATED_TOTAL);
    Lazy::force(&STATUS_TRANSITIONS_TOTAL);
    Lazy::force(&TRANSACTIONS_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
    Lazy::force(&SUPPLY_CHAIN_EVENTS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&STORE_OPERATION_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

//! Invoice Ledger Service - invoice lifecycle, settlement and supply-chain
//! traceability for agricultural trade.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use service_core::axum::{
    extract::State,
    http::{header, HeaderName, Method},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::LedgerConfig;
use crate::middleware::metrics::metrics_middleware;
use crate::services::Ledger;

#[derive(Clone)]
pub struct AppState {
    pub config: LedgerConfig,
    pub ledger: Arc<Ledger>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        // Invoices
        .route(
            "/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route("/invoices/:id", get(handlers::invoices::get_invoice))
        .route(
            "/invoices/:id/status",
            post(handlers::invoices::update_status),
        )
        .route("/invoices/:id/totals", get(handlers::invoices::get_totals))
        .route(
            "/invoices/:id/transactions",
            get(handlers::transactions::list_invoice_transactions),
        )
        // Transactions
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        // Supply chain
        .route(
            "/supply-chain/events",
            post(handlers::supply_chain::record_event),
        )
        .route(
            "/supply-chain/products/:product_id/events",
            get(handlers::supply_chain::product_trace),
        )
        // Analytics
        .route("/analytics/summary", get(handlers::analytics::summary))
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ]),
        )
}

/// Service health check
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.ledger.store();
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "ledger": {
                "invoices": store.invoice_count(),
                "transactions": store.transaction_count(),
                "supply_chain_events": store.event_count(),
            }
        }
    }))
}

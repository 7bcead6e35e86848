use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::models::{RecordSupplyChainEvent, SupplyChainEvent};
use crate::AppState;
use service_core::error::AppError;

/// Chronological trace of one product.
#[derive(Debug, Serialize)]
pub struct ProductTraceResponse {
    pub product_id: String,
    pub events: Vec<SupplyChainEvent>,
}

/// Record a supply-chain event.
///
/// POST /supply-chain/events
pub async fn record_event(
    State(state): State<AppState>,
    Json(req): Json<RecordSupplyChainEvent>,
) -> Result<(StatusCode, Json<SupplyChainEvent>), AppError> {
    let event = state.ledger.record_event(req)?;
    Ok((StatusCode::CREATED, Json(SupplyChainEvent::clone(&event))))
}

/// Events recorded for a product, oldest first.
///
/// GET /supply-chain/products/:product_id/events
pub async fn product_trace(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Json<ProductTraceResponse> {
    let events = state.ledger.product_trace(&product_id);
    Json(ProductTraceResponse {
        events: events.iter().cloned().collect(),
        product_id,
    })
}

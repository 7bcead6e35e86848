use axum::extract::{Json, State};

use crate::services::analytics::LedgerSummary;
use crate::AppState;

/// Revenue and status aggregates over the current ledger.
///
/// GET /analytics/summary
pub async fn summary(State(state): State<AppState>) -> Json<LedgerSummary> {
    Json(state.ledger.summary())
}

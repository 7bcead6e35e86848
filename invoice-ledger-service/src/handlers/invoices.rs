//! Invoice handlers.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::models::{CreateInvoice, Invoice, InvoiceQuery, InvoiceStatus, Transaction};
use crate::services::lifecycle::allowed_transitions;
use crate::services::tax::InvoiceTotals;
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request to change an invoice's status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InvoiceStatus,
    /// Only used when moving to `paid`.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Invoice plus the statuses it can move to next.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub next_statuses: Vec<InvoiceStatus>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            next_statuses: allowed_transitions(invoice.status()).to_vec(),
            invoice: invoice.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub previous_status: InvoiceStatus,
    pub invoice: InvoiceResponse,
    /// Present when the change settled the invoice.
    pub transaction: Option<Transaction>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an invoice.
///
/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(req): Json<CreateInvoice>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let invoice = state.ledger.create_invoice(req)?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&*invoice))))
}

/// List invoices, optionally filtered by status and party.
///
/// GET /invoices?status=&party_id=
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> Json<Vec<InvoiceResponse>> {
    let invoices = state.ledger.invoices(&query);
    Json(invoices.iter().map(InvoiceResponse::from).collect())
}

/// Get an invoice by id.
///
/// GET /invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.ledger.find_invoice(&id)?;
    Ok(Json(InvoiceResponse::from(&*invoice)))
}

/// Move an invoice along its lifecycle.
///
/// POST /invoices/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let change = state
        .ledger
        .update_status(&id, req.status, req.payment_method.as_deref())?;

    Ok(Json(StatusChangeResponse {
        previous_status: change.previous,
        invoice: InvoiceResponse::from(&*change.invoice),
        transaction: change.transaction.map(|tx| Transaction::clone(&tx)),
    }))
}

/// Subtotal, VAT and total for an invoice.
///
/// GET /invoices/:id/totals
pub async fn get_totals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceTotals>, AppError> {
    Ok(Json(state.ledger.invoice_totals(&id)?))
}

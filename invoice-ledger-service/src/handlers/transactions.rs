use axum::extract::{Json, Path, State};

use crate::models::Transaction;
use crate::AppState;
use service_core::error::AppError;

/// Get a settlement transaction by id.
///
/// GET /transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = state.ledger.find_transaction(&id)?;
    Ok(Json(Transaction::clone(&transaction)))
}

/// Transactions settling one invoice.
///
/// GET /invoices/:id/transactions
pub async fn list_invoice_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions = state.ledger.transactions_for_invoice(&id)?;
    Ok(Json(transactions.iter().cloned().collect()))
}

use crate::models::InvoiceStatus;
use service_core::error::AppError;
use thiserror::Error;

/// Failures of ledger operations. Every variant is caller-correctable and
/// leaves the store untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

impl LedgerError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation_error",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::DuplicateId(_) => "duplicate_id",
        }
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(err: validator::ValidationErrors) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => AppError::ValidationError(msg),
            e @ LedgerError::InvalidTransition { .. } => {
                AppError::InvalidTransition(anyhow::anyhow!(e.to_string()))
            }
            e @ LedgerError::NotFound { .. } => AppError::NotFound(anyhow::anyhow!(e.to_string())),
            e @ LedgerError::DuplicateId(_) => AppError::Conflict(anyhow::anyhow!(e.to_string())),
        }
    }
}

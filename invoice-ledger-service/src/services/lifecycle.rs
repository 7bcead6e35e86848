//! Invoice status state machine.
//!
//! ```text
//! draft -> pending -> approved -> paid
//!                  \-> rejected
//! ```
//!
//! `rejected` and `paid` are terminal.

use crate::models::{Invoice, InvoiceStatus};
use crate::services::error::LedgerError;

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: InvoiceStatus) -> &'static [InvoiceStatus] {
    match from {
        InvoiceStatus::Draft => &[InvoiceStatus::Pending],
        InvoiceStatus::Pending => &[InvoiceStatus::Approved, InvoiceStatus::Rejected],
        InvoiceStatus::Approved => &[InvoiceStatus::Paid],
        InvoiceStatus::Rejected | InvoiceStatus::Paid => &[],
    }
}

pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Apply a status change, producing the re-fingerprinted invoice.
///
/// The input is never modified; on error the caller keeps the original.
pub fn transition(invoice: &Invoice, to: InvoiceStatus) -> Result<Invoice, LedgerError> {
    let from = invoice.status();
    if !can_transition(from, to) {
        return Err(LedgerError::InvalidTransition { from, to });
    }
    Ok(invoice.with_status(to))
}

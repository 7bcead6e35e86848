//! VAT applied on top of an invoice's line total for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::Invoice;
use crate::services::error::LedgerError;

/// Standard VAT rate in Zambia.
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceTotals {
    pub invoice_id: String,
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxPolicy {
    vat_rate: Decimal,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            vat_rate: DEFAULT_VAT_RATE,
        }
    }
}

impl TaxPolicy {
    /// Rates are fractions, e.g. `0.16`. Must lie in `[0, 1]`.
    pub fn new(vat_rate: Decimal) -> Result<Self, LedgerError> {
        if vat_rate < Decimal::ZERO || vat_rate > Decimal::ONE {
            return Err(LedgerError::Validation(format!(
                "VAT rate must be between 0 and 1, got {}",
                vat_rate
            )));
        }
        Ok(Self { vat_rate })
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    /// Tax is rounded half-up to two decimal places.
    pub fn totals(&self, invoice: &Invoice) -> InvoiceTotals {
        let subtotal = invoice.total_amount();
        let tax = (subtotal * self.vat_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        InvoiceTotals {
            invoice_id: invoice.id().to_string(),
            subtotal,
            vat_rate: self.vat_rate,
            tax,
            total: subtotal + tax,
            currency: invoice.currency().to_string(),
        }
    }
}

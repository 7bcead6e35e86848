//! Invoice model for the ledger.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::party::{BuyerRef, FarmerRef};
use super::LedgerEntry;
use crate::services::error::LedgerError;
use crate::services::fingerprint::fingerprint;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Pending,
        InvoiceStatus::Approved,
        InvoiceStatus::Rejected,
        InvoiceStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Rejected and paid invoices accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Rejected | InvoiceStatus::Paid)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "pending" => Ok(InvoiceStatus::Pending),
            "approved" => Ok(InvoiceStatus::Approved),
            "rejected" => Ok(InvoiceStatus::Rejected),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Line item on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct InvoiceItem {
    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub name: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    pub price_per_unit: Decimal,
}

impl InvoiceItem {
    /// Quantity times unit price. Items held by a stored invoice are known not
    /// to overflow.
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.price_per_unit
    }

    fn checked_line_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.price_per_unit)
    }

    fn check_amounts(&self) -> Result<(), LedgerError> {
        if self.quantity <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Quantity for '{}' must be greater than zero",
                self.name
            )));
        }
        if self.price_per_unit < Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Price per unit for '{}' cannot be negative",
                self.name
            )));
        }
        Ok(())
    }
}

/// Defaults applied to fields a create request leaves out.
#[derive(Debug, Clone)]
pub struct InvoiceDefaults {
    pub currency: String,
    pub due_days: i64,
}

/// Input for creating an invoice.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoice {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub farmer: FarmerRef,
    pub buyer: BuyerRef,
    #[validate(length(min = 1, message = "Invoice must contain at least one item"))]
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Keep the invoice as a draft instead of submitting it.
    #[serde(default)]
    pub as_draft: bool,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    /// Matches either the farmer or the buyer id.
    pub party_id: Option<String>,
}

impl InvoiceQuery {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status() == s)
            && self
                .party_id
                .as_deref()
                .map_or(true, |party| invoice.involves(party))
    }
}

/// Invoice document. Only the status (and with it the content hash) changes
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    id: String,
    date: NaiveDate,
    due_date: NaiveDate,
    farmer: FarmerRef,
    buyer: BuyerRef,
    items: Vec<InvoiceItem>,
    status: InvoiceStatus,
    total_amount: Decimal,
    currency: String,
    content_hash: String,
}

impl Invoice {
    /// Validate `input` and build the invoice.
    ///
    /// `next_id` is only called once validation has passed, so a rejected
    /// request never consumes an id.
    pub fn create<F>(
        input: CreateInvoice,
        defaults: &InvoiceDefaults,
        today: NaiveDate,
        next_id: F,
    ) -> Result<Self, LedgerError>
    where
        F: FnOnce() -> String,
    {
        input.validate()?;
        input.farmer.validate()?;
        input.buyer.validate()?;
        for item in &input.items {
            item.validate()?;
            item.check_amounts()?;
        }

        let total_amount = input
            .items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| {
                item.checked_line_total()
                    .and_then(|line| sum.checked_add(line))
            })
            .ok_or_else(|| LedgerError::Validation("Invoice amount overflow".to_string()))?;
        if total_amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Invoice total must be greater than zero".to_string(),
            ));
        }

        let date = input.date.unwrap_or(today);
        let due_date = match input.due_date {
            Some(due_date) => due_date,
            None => u64::try_from(defaults.due_days)
                .ok()
                .and_then(|days| date.checked_add_days(Days::new(days)))
                .ok_or_else(|| {
                    LedgerError::Validation(format!(
                        "Due date {} days after {} is out of range",
                        defaults.due_days, date
                    ))
                })?,
        };
        if due_date < date {
            return Err(LedgerError::Validation(format!(
                "Due date {} is before invoice date {}",
                due_date, date
            )));
        }

        let currency = normalize_currency(input.currency.as_deref().unwrap_or(&defaults.currency))?;

        let status = if input.as_draft {
            InvoiceStatus::Draft
        } else {
            InvoiceStatus::Pending
        };

        Ok(Self::assemble(
            next_id(),
            date,
            due_date,
            input.farmer,
            input.buyer,
            input.items,
            total_amount,
            status,
            currency,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        id: String,
        date: NaiveDate,
        due_date: NaiveDate,
        farmer: FarmerRef,
        buyer: BuyerRef,
        items: Vec<InvoiceItem>,
        total_amount: Decimal,
        status: InvoiceStatus,
        currency: String,
    ) -> Self {
        let mut invoice = Self {
            id,
            date,
            due_date,
            farmer,
            buyer,
            items,
            status,
            total_amount,
            currency,
            content_hash: String::new(),
        };
        invoice.content_hash = fingerprint(&invoice);
        invoice
    }

    /// Copy of this invoice in `status`, with a freshly computed hash.
    pub(crate) fn with_status(&self, status: InvoiceStatus) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.content_hash = fingerprint(&next);
        next
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn farmer(&self) -> &FarmerRef {
        &self.farmer
    }

    pub fn buyer(&self) -> &BuyerRef {
        &self.buyer
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// True when `party_id` is the farmer or the buyer on this invoice.
    pub fn involves(&self, party_id: &str) -> bool {
        self.farmer.id == party_id || self.buyer.id == party_id
    }
}

impl LedgerEntry for Invoice {
    const KIND: &'static str = "Invoice";

    fn id(&self) -> &str {
        &self.id
    }

    fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// Trim and upper-case a 3-letter currency code.
pub(crate) fn normalize_currency(raw: &str) -> Result<String, LedgerError> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::Validation(format!(
            "Currency must be a 3-letter code, got '{}'",
            raw
        )));
    }
    Ok(code.to_ascii_uppercase())
}

//! Payment transaction model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Invoice, LedgerEntry};
use crate::services::error::LedgerError;
use crate::services::fingerprint::fingerprint;

/// Settlement status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment settling exactly one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    id: String,
    invoice_id: String,
    date: NaiveDate,
    amount: Decimal,
    currency: String,
    payment_method: String,
    status: TransactionStatus,
    content_hash: String,
}

impl Transaction {
    /// Completed settlement for the full amount of `invoice`. `next_id` is
    /// only called once the payment method has been accepted.
    pub(crate) fn settle<F>(
        invoice: &Invoice,
        payment_method: &str,
        date: NaiveDate,
        next_id: F,
    ) -> Result<Self, LedgerError>
    where
        F: FnOnce() -> String,
    {
        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(LedgerError::Validation(
                "Payment method cannot be empty".to_string(),
            ));
        }

        let mut transaction = Self {
            id: next_id(),
            invoice_id: invoice.id().to_string(),
            date,
            amount: invoice.total_amount(),
            currency: invoice.currency().to_string(),
            payment_method: payment_method.to_string(),
            status: TransactionStatus::Completed,
            content_hash: String::new(),
        };
        transaction.content_hash = fingerprint(&transaction);
        Ok(transaction)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

impl LedgerEntry for Transaction {
    const KIND: &'static str = "Transaction";

    fn id(&self) -> &str {
        &self.id
    }

    fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

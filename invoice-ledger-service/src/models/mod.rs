//! Domain models for invoice-ledger-service.

pub(crate) mod invoice;
mod party;
pub(crate) mod supply_chain;
mod transaction;

pub use invoice::{CreateInvoice, Invoice, InvoiceDefaults, InvoiceItem, InvoiceQuery, InvoiceStatus};
pub use party::{BuyerRef, FarmerRef};
pub use supply_chain::{RecordSupplyChainEvent, SupplyChainEvent};
pub use transaction::{Transaction, TransactionStatus};

/// Record held by the ledger store.
pub trait LedgerEntry: Send + Sync + 'static {
    /// Entry kind used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn content_hash(&self) -> &str;
}

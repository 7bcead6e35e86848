//! Services module for invoice-ledger-service.

pub mod analytics;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod store;
pub mod tax;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use metrics::{get_metrics, init_metrics};

//! HTTP handlers for invoice-ledger-service.

pub mod analytics;
pub mod invoices;
pub mod metrics;
pub mod supply_chain;
pub mod transactions;

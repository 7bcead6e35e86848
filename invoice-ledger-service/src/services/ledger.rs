//! Ledger facade: the entry point used by the HTTP handlers.

use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::{IdStrategy, LedgerSettings};
use crate::models::{
    CreateInvoice, Invoice, InvoiceDefaults, InvoiceQuery, InvoiceStatus, RecordSupplyChainEvent,
    SupplyChainEvent, Transaction,
};
use crate::services::analytics::{self, LedgerSummary};
use crate::services::error::LedgerError;
use crate::services::ids::{
    Clock, EntryKind, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator,
};
use crate::services::metrics::{
    currency_label, event_type_label, payment_method_label, ERRORS_TOTAL,
    INVOICES_CREATED_TOTAL, PAYMENT_AMOUNT_TOTAL, STATUS_TRANSITIONS_TOTAL,
    SUPPLY_CHAIN_EVENTS_TOTAL, TRANSACTIONS_TOTAL,
};
use crate::services::store::{Filtered, LedgerStore, Snapshot, StatusChange};
use crate::services::tax::{InvoiceTotals, TaxPolicy};

pub struct Ledger {
    store: LedgerStore,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    defaults: InvoiceDefaults,
    tax: TaxPolicy,
    settings: LedgerSettings,
}

impl Ledger {
    pub fn new(
        settings: LedgerSettings,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let tax = TaxPolicy::new(settings.vat_rate)?;
        let defaults = InvoiceDefaults {
            currency: settings.default_currency.clone(),
            due_days: settings.default_due_days,
        };
        Ok(Self {
            store: LedgerStore::new(),
            ids,
            clock,
            defaults,
            tax,
            settings,
        })
    }

    /// Ledger on the system clock with the configured id strategy.
    pub fn from_settings(settings: LedgerSettings) -> Result<Self, LedgerError> {
        let ids: Arc<dyn IdGenerator> = match settings.id_strategy {
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new()),
        };
        Self::new(settings, ids, Arc::new(SystemClock))
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(farmer_id = %input.farmer.id, buyer_id = %input.buyer.id))]
    pub fn create_invoice(&self, input: CreateInvoice) -> Result<Arc<Invoice>, LedgerError> {
        let invoice = Invoice::create(input, &self.defaults, self.clock.today(), || {
            self.ids.next_id(EntryKind::Invoice)
        })
        .and_then(|invoice| self.store.append_invoice(invoice))
        .map_err(|e| record_error("create_invoice", e))?;

        INVOICES_CREATED_TOTAL
            .with_label_values(&[invoice.status().as_str()])
            .inc();
        info!(
            invoice_id = %invoice.id(),
            status = %invoice.status(),
            total = %invoice.total_amount(),
            currency = %invoice.currency(),
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Move an invoice to `target`. Entering `paid` settles the invoice with
    /// `payment_method`, or the configured default when `None`.
    #[instrument(skip(self, payment_method), fields(invoice_id = %id, target = %target))]
    pub fn update_status(
        &self,
        id: &str,
        target: InvoiceStatus,
        payment_method: Option<&str>,
    ) -> Result<StatusChange, LedgerError> {
        let payment_method = payment_method.unwrap_or(self.settings.default_payment_method.as_str());

        let result = self.store.update_status(id, target, |invoice| {
            Transaction::settle(invoice, payment_method, self.clock.today(), || {
                self.ids.next_id(EntryKind::Transaction)
            })
        });

        match result {
            Ok(change) => {
                STATUS_TRANSITIONS_TOTAL
                    .with_label_values(&[change.previous.as_str(), target.as_str(), "success"])
                    .inc();
                if let Some(transaction) = &change.transaction {
                    TRANSACTIONS_TOTAL
                        .with_label_values(&[payment_method_label(transaction.payment_method())])
                        .inc();
                    if let Some(amount) = transaction.amount().to_f64() {
                        PAYMENT_AMOUNT_TOTAL
                            .with_label_values(&[currency_label(transaction.currency())])
                            .inc_by(amount);
                    }
                }
                info!(
                    from = %change.previous,
                    to = %target,
                    content_hash = %change.invoice.content_hash(),
                    "Invoice status changed"
                );
                Ok(change)
            }
            Err(e) => {
                let from = match &e {
                    LedgerError::InvalidTransition { from, .. } => from.as_str(),
                    _ => "unknown",
                };
                STATUS_TRANSITIONS_TOTAL
                    .with_label_values(&[from, target.as_str(), "rejected"])
                    .inc();
                Err(record_error("update_status", e))
            }
        }
    }

    /// Mark an approved invoice as paid and return its settlement.
    pub fn pay_invoice(
        &self,
        id: &str,
        payment_method: Option<&str>,
    ) -> Result<Arc<Transaction>, LedgerError> {
        let change = self.update_status(id, InvoiceStatus::Paid, payment_method)?;
        change.transaction.ok_or_else(|| {
            LedgerError::Validation(format!("Invoice {} was not settled", id))
        })
    }

    pub fn find_invoice(&self, id: &str) -> Result<Arc<Invoice>, LedgerError> {
        self.store.find_invoice(id)
    }

    pub fn invoices(&self, query: &InvoiceQuery) -> Snapshot<Invoice> {
        self.store.query(query)
    }

    pub fn filter<P>(&self, predicate: P) -> Filtered<Invoice, P>
    where
        P: Fn(&Invoice) -> bool,
    {
        self.store.filter(predicate)
    }

    /// Subtotal, VAT and gross total for display.
    pub fn invoice_totals(&self, id: &str) -> Result<InvoiceTotals, LedgerError> {
        let invoice = self.store.find_invoice(id)?;
        Ok(self.tax.totals(&invoice))
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    pub fn transactions_for_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Snapshot<Transaction>, LedgerError> {
        self.store.transactions_for_invoice(invoice_id)
    }

    pub fn find_transaction(&self, id: &str) -> Result<Arc<Transaction>, LedgerError> {
        self.store.find_transaction(id)
    }

    // -------------------------------------------------------------------------
    // Supply chain
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(product_id = %input.product_id, event_type = %input.event_type))]
    pub fn record_event(
        &self,
        input: RecordSupplyChainEvent,
    ) -> Result<Arc<SupplyChainEvent>, LedgerError> {
        let event = SupplyChainEvent::record(input, self.clock.now(), || {
            self.ids.next_id(EntryKind::SupplyChainEvent)
        })
        .and_then(|event| self.store.append_event(event))
        .map_err(|e| record_error("record_event", e))?;

        SUPPLY_CHAIN_EVENTS_TOTAL
            .with_label_values(&[event_type_label(event.event_type())])
            .inc();
        info!(event_id = %event.id(), timestamp = %event.timestamp(), "Supply-chain event recorded");
        Ok(event)
    }

    /// Events for a product, oldest first. Unknown products have no events.
    pub fn product_trace(&self, product_id: &str) -> Snapshot<SupplyChainEvent> {
        self.store.events_for_product(product_id)
    }

    // -------------------------------------------------------------------------
    // Analytics
    // -------------------------------------------------------------------------

    pub fn summary(&self) -> LedgerSummary {
        let snapshot = self.store.invoices();
        analytics::summarize(snapshot.iter())
    }
}

fn record_error(operation: &str, err: LedgerError) -> LedgerError {
    ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
    warn!(operation, error = %err, "Ledger operation failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::fixtures;
    use crate::models::supply_chain::fixtures as events;
    use crate::models::TransactionStatus;
    use crate::services::ids::ManualClock;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(
            LedgerSettings::default(),
            Arc::new(SequentialIdGenerator::new()),
            Arc::new(ManualClock::new(events::at(10))),
        )
        .unwrap()
    }

    #[test]
    fn test_create_then_pay_scenario() {
        let ledger = ledger();
        let invoice = ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        assert_eq!(invoice.id(), "INV-001");
        assert_eq!(invoice.total_amount(), dec!(130));
        assert_eq!(invoice.date(), fixtures::today());

        ledger
            .update_status("INV-001", InvoiceStatus::Approved, None)
            .unwrap();
        let tx = ledger.pay_invoice("INV-001", None).unwrap();
        assert_eq!(tx.id(), "TX-001");
        assert_eq!(tx.amount(), dec!(130));
        assert_eq!(tx.payment_method(), "mobile_money");
        assert_eq!(tx.status(), TransactionStatus::Completed);

        assert!(matches!(
            ledger.pay_invoice("INV-001", None),
            Err(LedgerError::InvalidTransition { .. })
        ));
        assert_eq!(ledger.transactions_for_invoice("INV-001").unwrap().len(), 1);
        assert_eq!(ledger.find_transaction("TX-001").unwrap().invoice_id(), "INV-001");
    }

    #[test]
    fn test_failed_create_does_not_advance_ids() {
        let ledger = ledger();
        let empty = fixtures::request("F001", "B001", vec![]);
        assert!(ledger.create_invoice(empty).is_err());

        let invoice = ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        assert_eq!(invoice.id(), "INV-001");
    }

    #[test]
    fn test_rejected_transition_does_not_draw_transaction_id() {
        let ledger = ledger();
        ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        assert!(ledger.pay_invoice("INV-001", Some("cash")).is_err());

        ledger
            .update_status("INV-001", InvoiceStatus::Approved, None)
            .unwrap();
        let tx = ledger.pay_invoice("INV-001", Some("cash")).unwrap();
        assert_eq!(tx.id(), "TX-001");
        assert_eq!(tx.payment_method(), "cash");
    }

    #[test]
    fn test_invoice_totals_apply_vat() {
        let ledger = ledger();
        ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        let totals = ledger.invoice_totals("INV-001").unwrap();
        assert_eq!(totals.tax, dec!(20.80));
        assert_eq!(totals.total, dec!(150.80));
        assert!(matches!(
            ledger.invoice_totals("INV-404"),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_record_event_defaults_timestamp_to_clock() {
        let ledger = ledger();
        let mut input = events::harvest("P001", 0);
        input.timestamp = None;
        let event = ledger.record_event(input).unwrap();
        assert_eq!(event.id(), "EVT-001");
        assert_eq!(event.timestamp(), events::at(10));

        let stale = events::harvest("P001", 9);
        assert!(matches!(
            ledger.record_event(stale),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.product_trace("P001").len(), 1);
        assert!(ledger.product_trace("P404").is_empty());
    }

    #[test]
    fn test_summary_reflects_store() {
        let ledger = ledger();
        ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        ledger
            .update_status("INV-002", InvoiceStatus::Approved, None)
            .unwrap();
        ledger.pay_invoice("INV-002", None).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.total_revenue, dec!(260));
        assert_eq!(summary.paid_revenue, dec!(130));
        assert_eq!(summary.outstanding_revenue, dec!(130));
    }

    #[test]
    fn test_failed_settlement_does_not_draw_transaction_id() {
        let ledger = ledger();
        ledger.create_invoice(fixtures::maize_and_beans()).unwrap();
        ledger
            .update_status("INV-001", InvoiceStatus::Approved, None)
            .unwrap();
        assert!(matches!(
            ledger.pay_invoice("INV-001", Some("   ")),
            Err(LedgerError::Validation(_))
        ));

        let tx = ledger.pay_invoice("INV-001", Some("bank_transfer")).unwrap();
        assert_eq!(tx.id(), "TX-001");
    }

    #[test]
    fn test_free_form_event_types_share_one_series() {
        let ledger = ledger();
        let mut input = events::harvest("P777", 0);
        input.event_type = "drone-survey-5e1d".to_string();
        ledger.record_event(input).unwrap();

        let exposition = crate::services::metrics::get_metrics();
        assert!(!exposition.contains("drone-survey-5e1d"));
        assert!(exposition.contains("event_type=\"other\""));
    }

    #[test]
    fn test_invalid_vat_rate_rejected() {
        let settings = LedgerSettings {
            vat_rate: dec!(1.2),
            ..LedgerSettings::default()
        };
        assert!(Ledger::from_settings(settings).is_err());
    }
}

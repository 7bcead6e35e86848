//! Append-only in-memory ledger store.
//!
//! All state sits behind a single `RwLock`. Writers hold the write lock for
//! the whole of a mutation, so a status change, its new hash and any
//! settlement transaction become visible together. Readers only hold the read
//! lock long enough to clone `Arc` pointers; iteration happens afterwards on
//! that snapshot.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::models::{
    Invoice, InvoiceQuery, InvoiceStatus, LedgerEntry, SupplyChainEvent, Transaction,
};
use crate::services::error::LedgerError;
use crate::services::lifecycle;
use crate::services::metrics::STORE_OPERATION_DURATION;

/// Immutable view of a collection at the moment it was taken.
#[derive(Debug)]
pub struct Snapshot<T> {
    entries: Vec<Arc<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order. Can be called any number of times.
    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone + '_ {
        self.entries.iter().map(|e| &**e)
    }

    /// Lazily filtered view over this snapshot.
    pub fn filter<P>(self, predicate: P) -> Filtered<T, P>
    where
        P: Fn(&T) -> bool,
    {
        Filtered {
            snapshot: self,
            predicate,
        }
    }
}

impl<T> IntoIterator for Snapshot<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Snapshot paired with a predicate. Nothing is evaluated until iterated.
pub struct Filtered<T, P> {
    snapshot: Snapshot<T>,
    predicate: P,
}

impl<T, P> Filtered<T, P>
where
    P: Fn(&T) -> bool,
{
    /// Matching entries in insertion order. Restartable.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.snapshot
            .iter()
            .filter(move |entry| (self.predicate)(*entry))
    }
}

impl<T, P> IntoIterator for Filtered<T, P>
where
    P: Fn(&T) -> bool,
{
    type Item = Arc<T>;
    type IntoIter = FilterIter<T, P>;

    fn into_iter(self) -> Self::IntoIter {
        FilterIter {
            inner: self.snapshot.into_iter(),
            predicate: self.predicate,
        }
    }
}

pub struct FilterIter<T, P> {
    inner: std::vec::IntoIter<Arc<T>>,
    predicate: P,
}

impl<T, P> Iterator for FilterIter<T, P>
where
    P: Fn(&T) -> bool,
{
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let predicate = &self.predicate;
        self.inner.find(|entry| predicate(&**entry))
    }
}

/// Id-addressed, insertion-ordered list of entries.
struct Collection<T> {
    entries: Vec<Arc<T>>,
    positions: HashMap<String, usize>,
}

impl<T: LedgerEntry> Collection<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn ensure_absent(&self, id: &str) -> Result<(), LedgerError> {
        if self.positions.contains_key(id) {
            return Err(LedgerError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, entry: T) -> Result<(usize, Arc<T>), LedgerError> {
        self.ensure_absent(entry.id())?;
        let position = self.entries.len();
        let entry = Arc::new(entry);
        self.positions.insert(entry.id().to_string(), position);
        self.entries.push(Arc::clone(&entry));
        Ok((position, entry))
    }

    fn position(&self, id: &str) -> Result<usize, LedgerError> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| LedgerError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })
    }

    fn get(&self, id: &str) -> Result<Arc<T>, LedgerError> {
        let position = self.position(id)?;
        Ok(Arc::clone(&self.entries[position]))
    }

    fn replace(&mut self, position: usize, entry: T) -> Arc<T> {
        let entry = Arc::new(entry);
        self.entries[position] = Arc::clone(&entry);
        entry
    }

    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            entries: self.entries.clone(),
        }
    }

    fn select<'a>(&self, positions: impl IntoIterator<Item = &'a usize>) -> Snapshot<T> {
        Snapshot {
            entries: positions
                .into_iter()
                .map(|&p| Arc::clone(&self.entries[p]))
                .collect(),
        }
    }
}

struct LedgerState {
    invoices: Collection<Invoice>,
    invoices_by_status: HashMap<InvoiceStatus, BTreeSet<usize>>,
    invoices_by_party: HashMap<String, BTreeSet<usize>>,
    transactions: Collection<Transaction>,
    transactions_by_invoice: HashMap<String, Vec<usize>>,
    events: Collection<SupplyChainEvent>,
    events_by_product: HashMap<String, Vec<usize>>,
}

/// Result of a successful status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub previous: InvoiceStatus,
    pub invoice: Arc<Invoice>,
    /// Present when the change settled the invoice.
    pub transaction: Option<Arc<Transaction>>,
}

pub struct LedgerStore {
    state: RwLock<LedgerState>,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState {
                invoices: Collection::new(),
                invoices_by_status: HashMap::new(),
                invoices_by_party: HashMap::new(),
                transactions: Collection::new(),
                transactions_by_invoice: HashMap::new(),
                events: Collection::new(),
                events_by_product: HashMap::new(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    /// Append a new invoice.
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id()))]
    pub fn append_invoice(&self, invoice: Invoice) -> Result<Arc<Invoice>, LedgerError> {
        let _timer = STORE_OPERATION_DURATION
            .with_label_values(&["append_invoice"])
            .start_timer();

        let mut state = self.state.write();
        let status = invoice.status();
        let parties = [invoice.farmer().id.clone(), invoice.buyer().id.clone()];

        let (position, invoice) = state.invoices.push(invoice)?;
        state
            .invoices_by_status
            .entry(status)
            .or_default()
            .insert(position);
        for party in parties {
            state
                .invoices_by_party
                .entry(party)
                .or_default()
                .insert(position);
        }

        debug!(position, status = %status, "Invoice appended");
        Ok(invoice)
    }

    /// Move an invoice to `target`.
    ///
    /// When the target is `paid`, `settle` builds the settlement transaction;
    /// it runs under the write lock, at most once per invoice. Nothing is
    /// written unless every step succeeds.
    #[instrument(skip(self, settle), fields(invoice_id = %id, target = %target))]
    pub fn update_status<F>(
        &self,
        id: &str,
        target: InvoiceStatus,
        settle: F,
    ) -> Result<StatusChange, LedgerError>
    where
        F: FnOnce(&Invoice) -> Result<Transaction, LedgerError>,
    {
        let _timer = STORE_OPERATION_DURATION
            .with_label_values(&["update_status"])
            .start_timer();

        let mut state = self.state.write();
        let position = state.invoices.position(id)?;
        let current = Arc::clone(&state.invoices.entries[position]);
        let next = lifecycle::transition(&current, target)?;

        let transaction = if target == InvoiceStatus::Paid {
            let transaction = settle(&next)?;
            state.transactions.ensure_absent(transaction.id())?;
            Some(transaction)
        } else {
            None
        };

        let from = current.status();
        if let Some(positions) = state.invoices_by_status.get_mut(&from) {
            positions.remove(&position);
        }
        state
            .invoices_by_status
            .entry(target)
            .or_default()
            .insert(position);
        let invoice = state.invoices.replace(position, next);

        let transaction = match transaction {
            Some(transaction) => {
                let (tx_position, transaction) = state.transactions.push(transaction)?;
                state
                    .transactions_by_invoice
                    .entry(invoice.id().to_string())
                    .or_default()
                    .push(tx_position);
                info!(transaction_id = %transaction.id(), amount = %transaction.amount(), "Invoice settled");
                Some(transaction)
            }
            None => None,
        };

        debug!(from = %from, to = %target, hash = %invoice.content_hash(), "Invoice status updated");
        Ok(StatusChange {
            previous: from,
            invoice,
            transaction,
        })
    }

    pub fn find_invoice(&self, id: &str) -> Result<Arc<Invoice>, LedgerError> {
        self.state.read().invoices.get(id)
    }

    /// Every invoice, in insertion order.
    pub fn invoices(&self) -> Snapshot<Invoice> {
        self.state.read().invoices.snapshot()
    }

    /// Lazy predicate filter over a snapshot taken now.
    pub fn filter<P>(&self, predicate: P) -> Filtered<Invoice, P>
    where
        P: Fn(&Invoice) -> bool,
    {
        self.invoices().filter(predicate)
    }

    /// Index-backed filter by status and/or party.
    pub fn query(&self, query: &InvoiceQuery) -> Snapshot<Invoice> {
        let _timer = STORE_OPERATION_DURATION
            .with_label_values(&["query_invoices"])
            .start_timer();

        let state = self.state.read();
        let by_status = query
            .status
            .map(|s| state.invoices_by_status.get(&s));
        let by_party = query
            .party_id
            .as_deref()
            .map(|p| state.invoices_by_party.get(p));

        let empty = BTreeSet::new();
        match (by_status, by_party) {
            (None, None) => state.invoices.snapshot(),
            (Some(status), None) => state.invoices.select(status.unwrap_or(&empty)),
            (None, Some(party)) => state.invoices.select(party.unwrap_or(&empty)),
            (Some(status), Some(party)) => {
                let status = status.unwrap_or(&empty);
                let party = party.unwrap_or(&empty);
                state.invoices.select(status.intersection(party))
            }
        }
    }

    pub fn invoice_count(&self) -> usize {
        self.state.read().invoices.entries.len()
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    pub fn find_transaction(&self, id: &str) -> Result<Arc<Transaction>, LedgerError> {
        self.state.read().transactions.get(id)
    }

    pub fn transactions(&self) -> Snapshot<Transaction> {
        self.state.read().transactions.snapshot()
    }

    /// Transactions settling `invoice_id`; fails if the invoice is unknown.
    pub fn transactions_for_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Snapshot<Transaction>, LedgerError> {
        let state = self.state.read();
        state.invoices.position(invoice_id)?;
        Ok(match state.transactions_by_invoice.get(invoice_id) {
            Some(positions) => state.transactions.select(positions),
            None => Snapshot {
                entries: Vec::new(),
            },
        })
    }

    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.entries.len()
    }

    // -------------------------------------------------------------------------
    // Supply-chain events
    // -------------------------------------------------------------------------

    /// Append an event. Timestamps must not go backwards within a product.
    #[instrument(skip(self, event), fields(event_id = %event.id(), product_id = %event.product_id()))]
    pub fn append_event(
        &self,
        event: SupplyChainEvent,
    ) -> Result<Arc<SupplyChainEvent>, LedgerError> {
        let _timer = STORE_OPERATION_DURATION
            .with_label_values(&["append_event"])
            .start_timer();

        let mut state = self.state.write();
        state.events.ensure_absent(event.id())?;

        let last = state
            .events_by_product
            .get(event.product_id())
            .and_then(|positions| positions.last())
            .map(|&p| state.events.entries[p].timestamp());
        if let Some(last) = last {
            if event.timestamp() < last {
                return Err(LedgerError::Validation(format!(
                    "Event timestamp {} is earlier than the last event for product {} ({})",
                    event.timestamp(),
                    event.product_id(),
                    last
                )));
            }
        }

        let product_id = event.product_id().to_string();
        let (position, event) = state.events.push(event)?;
        state
            .events_by_product
            .entry(product_id)
            .or_default()
            .push(position);
        Ok(event)
    }

    pub fn find_event(&self, id: &str) -> Result<Arc<SupplyChainEvent>, LedgerError> {
        self.state.read().events.get(id)
    }

    /// Events for one product in chronological (= insertion) order.
    pub fn events_for_product(&self, product_id: &str) -> Snapshot<SupplyChainEvent> {
        let state = self.state.read();
        match state.events_by_product.get(product_id) {
            Some(positions) => state.events.select(positions),
            None => Snapshot {
                entries: Vec::new(),
            },
        }
    }

    pub fn event_count(&self) -> usize {
        self.state.read().events.entries.len()
    }
}

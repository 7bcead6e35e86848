//! Content fingerprints for ledger entries.
//!
//! A fingerprint is SHA-256 over the compact JSON encoding of an entry's
//! significant fields, rendered as `0x` followed by 64 lowercase hex digits.
//! Object keys are emitted in a fixed order, decimals are normalized so that
//! `2.50` and `2.5` hash alike, and nothing depends on randomness or the
//! clock.

use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::models::{Invoice, InvoiceItem, LedgerEntry, SupplyChainEvent, Transaction};

/// Length of a fingerprint string including the `0x` prefix.
pub const FINGERPRINT_LEN: usize = 66;

/// Entries that can be fingerprinted.
pub trait Fingerprint {
    /// The significant fields of the entry. Must not include the hash itself.
    fn canonical(&self) -> Value;
}

pub fn fingerprint<E: Fingerprint + ?Sized>(entry: &E) -> String {
    // Value's Serialize impl cannot fail.
    let bytes = serde_json::to_vec(&entry.canonical()).unwrap_or_default();
    format!("0x{}", hex::encode(Sha256::digest(&bytes)))
}

/// True when the stored hash matches the entry's current content.
pub fn verify<E: Fingerprint + LedgerEntry>(entry: &E) -> bool {
    fingerprint(entry) == entry.content_hash()
}

fn amount(value: Decimal) -> Value {
    Value::String(value.normalize().to_string())
}

fn item(item: &InvoiceItem) -> Value {
    json!({
        "name": item.name,
        "quantity": amount(item.quantity),
        "unit": item.unit,
        "price_per_unit": amount(item.price_per_unit),
    })
}

impl Fingerprint for Invoice {
    fn canonical(&self) -> Value {
        json!({
            "kind": "invoice",
            "id": self.id(),
            "date": self.date().to_string(),
            "due_date": self.due_date().to_string(),
            "farmer": {
                "id": self.farmer().id,
                "name": self.farmer().name,
                "location": self.farmer().location,
                "phone": self.farmer().phone,
            },
            "buyer": {
                "id": self.buyer().id,
                "name": self.buyer().name,
                "location": self.buyer().location,
            },
            "items": self.items().iter().map(item).collect::<Vec<_>>(),
            "status": self.status().as_str(),
            "total_amount": amount(self.total_amount()),
            "currency": self.currency(),
        })
    }
}

impl Fingerprint for Transaction {
    fn canonical(&self) -> Value {
        json!({
            "kind": "transaction",
            "id": self.id(),
            "invoice_id": self.invoice_id(),
            "date": self.date().to_string(),
            "amount": amount(self.amount()),
            "currency": self.currency(),
            "payment_method": self.payment_method(),
            "status": self.status().as_str(),
        })
    }
}

impl Fingerprint for SupplyChainEvent {
    fn canonical(&self) -> Value {
        json!({
            "kind": "supply_chain_event",
            "id": self.id(),
            "product_id": self.product_id(),
            "farmer_id": self.farmer_id(),
            "buyer_id": self.buyer_id(),
            "event_type": self.event_type(),
            "location": self.location(),
            "timestamp": self.timestamp().to_rfc3339_opts(SecondsFormat::Nanos, true),
            "details": self.details(),
        })
    }
}

//! Supply-chain traceability events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::LedgerEntry;
use crate::services::error::LedgerError;
use crate::services::fingerprint::fingerprint;

/// Input for recording a supply-chain event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordSupplyChainEvent {
    #[validate(length(min = 1, message = "Product id cannot be empty"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "Farmer id cannot be empty"))]
    pub farmer_id: String,
    #[serde(default)]
    pub buyer_id: Option<String>,
    #[validate(length(min = 1, message = "Event type cannot be empty"))]
    pub event_type: String,
    #[serde(default)]
    pub location: String,
    /// Defaults to the ledger clock when omitted.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: String,
}

/// A timestamped handling step for a product (harvest, storage, transport...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplyChainEvent {
    id: String,
    product_id: String,
    farmer_id: String,
    buyer_id: Option<String>,
    event_type: String,
    location: String,
    timestamp: DateTime<Utc>,
    details: String,
    content_hash: String,
}

impl SupplyChainEvent {
    /// Validate `input` and build the event. `next_id` is only called once
    /// validation has passed.
    pub fn record<F>(
        input: RecordSupplyChainEvent,
        now: DateTime<Utc>,
        next_id: F,
    ) -> Result<Self, LedgerError>
    where
        F: FnOnce() -> String,
    {
        input.validate()?;

        let buyer_id = input
            .buyer_id
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let mut event = Self {
            id: next_id(),
            product_id: input.product_id,
            farmer_id: input.farmer_id,
            buyer_id,
            event_type: input.event_type,
            location: input.location,
            timestamp: input.timestamp.unwrap_or(now),
            details: input.details,
            content_hash: String::new(),
        };
        event.content_hash = fingerprint(&event);
        Ok(event)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn farmer_id(&self) -> &str {
        &self.farmer_id
    }

    pub fn buyer_id(&self) -> Option<&str> {
        self.buyer_id.as_deref()
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

impl LedgerEntry for SupplyChainEvent {
    const KIND: &'static str = "SupplyChainEvent";

    fn id(&self) -> &str {
        &self.id
    }

    fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

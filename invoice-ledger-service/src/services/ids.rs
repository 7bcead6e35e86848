//! Id generation and time sources injected into the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Kind of entry an id is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Invoice,
    Transaction,
    SupplyChainEvent,
}

impl EntryKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntryKind::Invoice => "INV",
            EntryKind::Transaction => "TX",
            EntryKind::SupplyChainEvent => "EVT",
        }
    }

    fn index(&self) -> usize {
        match self {
            EntryKind::Invoice => 0,
            EntryKind::Transaction => 1,
            EntryKind::SupplyChainEvent => 2,
        }
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: EntryKind) -> String;
}

/// Random ids, e.g. `INV-6f1c...`.
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, kind: EntryKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4())
    }
}

/// Monotonic per-kind counters, e.g. `INV-001`, `INV-002`.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counters: [AtomicU64; 3],
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, kind: EntryKind) -> String {
        let n = self.counters[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:03}", kind.prefix(), n)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sequential_ids_are_per_kind() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_id(EntryKind::Invoice), "INV-001");
        assert_eq!(ids.next_id(EntryKind::Invoice), "INV-002");
        assert_eq!(ids.next_id(EntryKind::Transaction), "TX-001");
        assert_eq!(ids.next_id(EntryKind::SupplyChainEvent), "EVT-001");
    }

    #[test]
    fn test_uuid_ids_are_prefixed_and_unique() {
        let ids = UuidIdGenerator;
        let a = ids.next_id(EntryKind::Invoice);
        let b = ids.next_id(EntryKind::Invoice);
        assert!(a.starts_with("INV-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 7, 18, 23, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 7, 18).unwrap());

        clock.advance(chrono::Duration::hours(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 7, 19).unwrap());
    }
}

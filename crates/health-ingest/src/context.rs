//! Shared record collection and identity index threaded through every parser.

use std::collections::HashSet;

use health_model::{IdentityKey, Record};
use tracing::info;

/// Accepted-record interval between progress messages.
pub const PROGRESS_INTERVAL: usize = 50_000;

/// Records accepted so far, plus the identity keys that guard against duplicates.
///
/// Owned by the driver and lent to each parser for the duration of one call.
/// Uniqueness holds across sources because every insert goes through
/// [`IngestContext::insert`].
#[derive(Debug, Default)]
pub struct IngestContext {
    records: Vec<Record>,
    seen: HashSet<IdentityKey>,
}

impl IngestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` unless an identical observation was already accepted.
    ///
    /// Returns true when the record was added.
    pub fn insert(&mut self, record: Record) -> bool {
        if !self.seen.insert(record.identity_key()) {
            return false;
        }
        self.records.push(record);
        let total = self.records.len();
        if total % PROGRESS_INTERVAL == 0 {
            info!(total, "progress: {total} records extracted");
        }
        true
    }

    /// Returns true if an observation with this identity was already accepted.
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the context, returning records in insertion order.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

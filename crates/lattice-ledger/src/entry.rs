/// Ledger values and snapshots.
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::LedgerError;

/// An opaque ledger value.
///
/// Values cross the ledger as structural JSON. Callers decode them into
/// typed records on read; a decode failure is distinct from an absent
/// key (lookup returns `None` for those).
#[derive(Debug, Clone, PartialEq)]
pub struct Entry(serde_json::Value);

impl Entry {
    /// Encode a typed record into a ledger value.
    pub fn encode<T: Serialize>(record: &T) -> Result<Self, LedgerError> {
        serde_json::to_value(record)
            .map(Self)
            .map_err(LedgerError::Encode)
    }

    /// Wrap a raw structural value.
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Decode into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, LedgerError> {
        serde_json::from_value(self.0.clone()).map_err(LedgerError::Decode)
    }
}

/// Full local view of all buckets at one instant.
///
/// Snapshots are taken without blocking on replication and may be stale
/// relative to other peers' views.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    buckets: HashMap<String, HashMap<String, Entry>>,
}

impl Snapshot {
    pub fn new(buckets: HashMap<String, HashMap<String, Entry>>) -> Self {
        Self { buckets }
    }

    /// All entries of one bucket, if the bucket exists.
    pub fn bucket(&self, name: &str) -> Option<&HashMap<String, Entry>> {
        self.buckets.get(name)
    }
}

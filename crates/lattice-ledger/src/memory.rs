/// In-process implementation of the [`Ledger`] contract.
///
/// Backs tests and single-process simulations: cloned handles share one
/// underlying store, so a simulated cluster observes each node's writes
/// with zero replication lag. The replicated ledger proper is external
/// to this workspace.
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Entry, Ledger, Snapshot};

type Buckets = HashMap<String, HashMap<String, Entry>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    buckets: Arc<RwLock<Buckets>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MemoryLedger {
    fn add(&self, bucket: &str, entries: HashMap<String, Entry>) {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(bucket.to_string())
            .or_default()
            .extend(entries);
    }

    fn get_key(&self, bucket: &str, key: &str) -> Option<Entry> {
        let buckets = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        buckets.get(bucket).and_then(|b| b.get(key)).cloned()
    }

    fn last_block(&self) -> Snapshot {
        let buckets = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Snapshot::new(buckets.clone())
    }

    fn delete_bucket(&self, bucket: &str) {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        buckets.remove(bucket);
        tracing::debug!(bucket, "bucket deleted");
    }
}

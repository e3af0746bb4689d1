//! Lattice ledger facade.
//!
//! The coordination core reads and writes an eventually-consistent,
//! replicated key/value store organized into named buckets. The store
//! itself (block structure, gossip transport, conflict merging) lives
//! outside this workspace; this crate pins down the contract the core
//! depends on, plus an in-process [`MemoryLedger`] for tests and
//! single-process simulations.
//!
//! Consistency model: writes are merge-writes broadcast to peers and
//! become visible in other nodes' snapshots eventually. Reads never
//! block on replication and may be stale. No ordering is guaranteed
//! across peers.

mod announce;
mod entry;
mod error;
mod memory;

pub use announce::announce;
pub use entry::{Entry, Snapshot};
pub use error::LedgerError;
pub use memory::MemoryLedger;

use std::collections::HashMap;

/// Contract of the replicated bucket store.
///
/// Implementations must be safe for concurrent read/write from any
/// number of callers; the core shares one handle across all of its
/// timer-driven tasks.
pub trait Ledger: Send + Sync + 'static {
    /// Merge-write `entries` into `bucket`, replacing existing keys.
    ///
    /// The write applies to the local snapshot immediately and is
    /// broadcast to peers for eventual network-wide visibility.
    fn add(&self, bucket: &str, entries: HashMap<String, Entry>);

    /// Point lookup against the local snapshot.
    ///
    /// `None` means absent. A present entry that fails to decode into
    /// the expected record is a distinct condition, reported by
    /// [`Entry::decode`].
    fn get_key(&self, bucket: &str, key: &str) -> Option<Entry>;

    /// Full local snapshot of all buckets.
    fn last_block(&self) -> Snapshot;

    /// Remove every key in `bucket`, broadcast to peers.
    fn delete_bucket(&self, bucket: &str);
}

/// Deterministic leader election over the live-peer set.
///
/// Every node runs the same pure function over its own snapshot view
/// and arrives at the same winner whenever the views agree. No
/// consensus protocol needed — determinism does the work. Views can
/// disagree during replication lag; the scrub path tolerates the
/// resulting duplicate leaders (deletes self-heal on the next
/// heartbeat tick).
use crate::types::PeerId;

/// Elect the leader of `peers`: the lexicographically smallest id.
///
/// Order-independent with respect to the input enumeration, `None` for
/// an empty set. For a single peer, that peer leads.
pub fn elect_leader(peers: &[PeerId]) -> Option<PeerId> {
    peers.iter().min().cloned()
}

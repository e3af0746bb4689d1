/// Liveness monitor and scrub scheduler.
///
/// Each node periodically refreshes its own heartbeat entry in the
/// `healthcheck` bucket and recomputes, from the local snapshot, the
/// set of currently-live peers. The bucket only ever grows between
/// scrubs; the elected leader deletes it wholesale once per scrub
/// interval and the next heartbeat tick from every live node restores
/// it.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lattice_ledger::{announce, Entry, Ledger, Snapshot};

use crate::election::elect_leader;
use crate::types::{PeerId, HEALTHCHECK_BUCKET};

/// Live peers in `snapshot` as of `now`.
///
/// An entry counts as live iff its heartbeat is strictly younger than
/// `ttl`; an entry aged exactly `ttl` is out. Entries whose timestamp
/// or key fail to parse are silently excluded rather than failing the
/// whole computation — fail-open per entry, by design.
pub fn live_peers(snapshot: &Snapshot, ttl: Duration, now: DateTime<Utc>) -> Vec<PeerId> {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    let mut active = Vec::new();

    let Some(bucket) = snapshot.bucket(HEALTHCHECK_BUCKET) else {
        return active;
    };

    for (key, entry) in bucket {
        let Ok(peer) = key.parse::<PeerId>() else {
            tracing::debug!(key, "skipping heartbeat entry with malformed peer id");
            continue;
        };
        let Ok(stamp) = entry.decode::<String>() else {
            tracing::debug!(peer = %peer, "skipping undecodable heartbeat entry");
            continue;
        };
        let Ok(last) = DateTime::parse_from_rfc3339(&stamp) else {
            tracing::debug!(peer = %peer, stamp, "skipping unparsable heartbeat timestamp");
            continue;
        };

        if now.signed_duration_since(last.with_timezone(&Utc)) < ttl {
            active.push(peer);
        }
    }

    active
}

/// Convenience wrapper: live peers from the ledger's current snapshot.
pub fn available_nodes(ledger: &dyn Ledger, ttl: Duration) -> Vec<PeerId> {
    live_peers(&ledger.last_block(), ttl, Utc::now())
}

/// Per-node scrub bookkeeping: one local timestamp, one decision.
///
/// Owned exclusively by the liveness task; only one monitor tick runs
/// at a time for a node, so no locking is needed.
pub struct ScrubScheduler {
    last_check: DateTime<Utc>,
    interval: TimeDelta,
}

impl ScrubScheduler {
    /// Create a scheduler whose window starts now.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Utc::now())
    }

    /// Create with an explicit window start (for testing).
    pub fn starting_at(interval: Duration, start: DateTime<Utc>) -> Self {
        Self {
            last_check: start,
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Decide whether this node must scrub the healthcheck bucket now.
    ///
    /// Returns `false` while the live set is empty or the interval has
    /// not elapsed. Once it has elapsed, the window resets for leaders
    /// and non-leaders alike — otherwise non-leaders would re-enter
    /// this branch every tick and a mid-window leadership hand-off
    /// could issue duplicate deletes. A consequence kept on purpose: a
    /// freshly-elected leader may wait one full extra interval before
    /// its first scrub.
    pub fn should_scrub(&mut self, local_id: &PeerId, peers: &[PeerId], now: DateTime<Utc>) -> bool {
        if peers.is_empty() {
            return false;
        }
        let Some(leader) = elect_leader(peers) else {
            return false;
        };
        if now.signed_duration_since(self.last_check) < self.interval {
            return false;
        }
        self.last_check = now;
        leader == *local_id
    }
}

/// Start the recurring liveness task: heartbeat refresh plus
/// leadership-gated scrub, once per announce interval until `cancel`
/// fires.
///
/// Ledger-write failures are not surfaced; a missed write self-heals on
/// the next tick.
pub fn start_liveness(
    ledger: Arc<dyn Ledger>,
    local_id: PeerId,
    announce_interval: Duration,
    scrub_interval: Duration,
    liveness_ttl: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut scheduler = ScrubScheduler::new(scrub_interval);

    announce(cancel, announce_interval, move || {
        let now = Utc::now();
        let stamp = Entry::from_value(serde_json::Value::String(now.to_rfc3339()));
        ledger.add(
            HEALTHCHECK_BUCKET,
            HashMap::from([(local_id.to_string(), stamp)]),
        );

        let peers = live_peers(&ledger.last_block(), liveness_ttl, Utc::now());
        if scheduler.should_scrub(&local_id, &peers, Utc::now()) {
            tracing::info!(leader = %local_id, "scrubbing healthcheck bucket");
            ledger.delete_bucket(HEALTHCHECK_BUCKET);
        }

        std::future::ready(())
    })
}

/// Ledger-backed service and access-grant registry.
///
/// Maps logical service names to the peer hosting them (`services`
/// bucket) and peer identities to access-grant records (`users`
/// bucket). Advisory bookkeeping only: any peer can claim a service or
/// grant itself access. The registry provides discovery, not
/// authentication.
///
/// Registry entries carry no TTL. A service claim converges to the
/// correct owner through re-announcement; a grant, once issued, is
/// never refreshed, expired, or revoked by this core.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lattice_ledger::{announce, Entry, Ledger};

use crate::types::{PeerId, SERVICES_BUCKET, USERS_BUCKET};

/// Value stored in the `services` bucket, keyed by service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// String form of the owning peer's identity.
    pub peer_id: String,
    /// The service name, repeated for self-describing entries.
    pub name: String,
}

/// Value stored in the `users` bucket, keyed by peer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub peer_id: String,
    /// RFC 3339 instant at which the grant was first issued.
    pub timestamp: String,
}

#[derive(Clone)]
pub struct ServiceRegistry {
    ledger: Arc<dyn Ledger>,
}

impl ServiceRegistry {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// One publish tick: claim `service` for `owner` unless the ledger
    /// already shows `owner` as the owner.
    ///
    /// Writing only on absence or mismatch keeps the steady state
    /// write-free while still converging over a stale foreign claim.
    /// An entry that fails to decode counts as a mismatch.
    pub fn publish_once(&self, service: &str, owner: &PeerId) {
        let current = self
            .ledger
            .get_key(SERVICES_BUCKET, service)
            .and_then(|entry| entry.decode::<ServiceRecord>().ok());

        match current {
            Some(record) if record.peer_id == owner.as_str() => {}
            _ => {
                let record = ServiceRecord {
                    peer_id: owner.to_string(),
                    name: service.to_string(),
                };
                match Entry::encode(&record) {
                    Ok(entry) => {
                        self.ledger
                            .add(SERVICES_BUCKET, HashMap::from([(service.to_string(), entry)]));
                        tracing::debug!(service, owner = %owner, "published service claim");
                    }
                    Err(e) => tracing::debug!(service, error = %e, "service record encode failed"),
                }
            }
        }
    }

    /// One grant tick: record a grant for `peer` unless one exists.
    ///
    /// An issued grant is never re-timestamped.
    pub fn grant_once(&self, peer: &PeerId) {
        if self.ledger.get_key(USERS_BUCKET, peer.as_str()).is_some() {
            return;
        }
        let record = UserRecord {
            peer_id: peer.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        match Entry::encode(&record) {
            Ok(entry) => {
                self.ledger
                    .add(USERS_BUCKET, HashMap::from([(peer.to_string(), entry)]));
                tracing::debug!(peer = %peer, "granted access");
            }
            Err(e) => tracing::debug!(peer = %peer, error = %e, "user record encode failed"),
        }
    }

    /// Resolve a service name to its current owner, if known.
    ///
    /// Point lookup against the local snapshot; an undecodable entry
    /// resolves to `None`.
    pub fn resolve(&self, service: &str) -> Option<ServiceRecord> {
        self.ledger
            .get_key(SERVICES_BUCKET, service)
            .and_then(|entry| entry.decode::<ServiceRecord>().ok())
    }

    /// Whether `peer` holds an access grant.
    pub fn is_granted(&self, peer: &PeerId) -> bool {
        self.ledger.get_key(USERS_BUCKET, peer.as_str()).is_some()
    }

    /// Keep `service -> owner` fresh on a recurring timer.
    pub fn publish(
        &self,
        cancel: CancellationToken,
        interval: Duration,
        service: String,
        owner: PeerId,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        announce(cancel, interval, move || {
            registry.publish_once(&service, &owner);
            std::future::ready(())
        })
    }

    /// Keep a grant for `peer` present on a recurring timer.
    pub fn grant(
        &self,
        cancel: CancellationToken,
        interval: Duration,
        peer: PeerId,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        announce(cancel, interval, move || {
            registry.grant_once(&peer);
            std::future::ready(())
        })
    }
}

/// A lattice node: one identity plus explicitly injected ledger and
/// transport handles.
///
/// Nothing here is ambient or global; every component receives the
/// shared handles at construction. Concurrency safety of the ledger is
/// the ledger's own contract.
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lattice_ledger::Ledger;

use crate::alive;
use crate::config::NodeConfig;
use crate::error::LatticeError;
use crate::registry::ServiceRegistry;
use crate::transport::Transport;
use crate::tunnel::{self, TunnelListener};
use crate::types::PeerId;

pub struct Node {
    peer_id: PeerId,
    ledger: Arc<dyn Ledger>,
    transport: Arc<dyn Transport>,
    config: NodeConfig,
}

impl Node {
    pub fn new(
        peer_id: PeerId,
        ledger: Arc<dyn Ledger>,
        transport: Arc<dyn Transport>,
        config: NodeConfig,
    ) -> Self {
        Self {
            peer_id,
            ledger,
            transport,
            config,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// A registry view over this node's ledger handle.
    pub fn registry(&self) -> ServiceRegistry {
        ServiceRegistry::new(self.ledger.clone())
    }

    /// Start the heartbeat/scrub task. Cancelling the token stops
    /// future ticks; a tick in progress completes.
    pub fn start_liveness(&self, cancel: CancellationToken) -> JoinHandle<()> {
        alive::start_liveness(
            self.ledger.clone(),
            self.peer_id.clone(),
            self.config.announce_interval,
            self.config.scrub_interval,
            self.config.liveness_ttl,
            cancel,
        )
    }

    /// The currently-live peers, recomputed fresh from the snapshot.
    pub fn available_nodes(&self) -> Vec<PeerId> {
        alive::available_nodes(self.ledger.as_ref(), self.config.liveness_ttl)
    }

    /// Expose `service`, forwarding inbound tunnel streams to the local
    /// `dst_address` endpoint. Returns the service-claim task's handle;
    /// it ends when `cancel` fires.
    pub fn expose_service(
        &self,
        cancel: CancellationToken,
        service: &str,
        dst_address: &str,
    ) -> JoinHandle<()> {
        tunnel::expose(
            self.registry(),
            self.transport.clone(),
            self.peer_id.clone(),
            &self.config,
            cancel,
            service.to_string(),
            dst_address.to_string(),
        )
    }

    /// Connect to `service` through a local listener on `listen_addr`.
    ///
    /// Fails synchronously only if the listener cannot be bound.
    pub async fn connect_to_service(
        &self,
        cancel: CancellationToken,
        service: &str,
        listen_addr: &str,
    ) -> Result<TunnelListener, LatticeError> {
        tunnel::connect(
            self.registry(),
            self.transport.clone(),
            self.peer_id.clone(),
            &self.config,
            cancel,
            service.to_string(),
            listen_addr.to_string(),
        )
        .await
    }
}

/// Errors surfaced by the lattice coordination core.
///
/// Most failures here are handled locally (logged, single connection
/// torn down) and never propagate; the variants below cover the few
/// synchronous surfaces plus the transport facade.
use crate::types::PeerId;

#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("failed to bind local listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid peer id: '{0}'")]
    InvalidPeerId(String),

    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    #[error("peer {peer_id} has no handler for protocol '{protocol}'")]
    UnknownProtocol { peer_id: PeerId, protocol: String },

    #[error("ledger error: {0}")]
    Ledger(#[from] lattice_ledger::LedgerError),
}

//! Lattice coordination core.
//!
//! The logic layer of a decentralized virtual network: nodes discover
//! each other's liveness through a replicated ledger, elect a
//! transient leader to garbage-collect stale heartbeat state, and
//! tunnel raw byte streams for named services across peer connections.
//! There is no central coordinator; everything converges through the
//! eventually-consistent ledger, and the protocol tolerates stale
//! views, duplicate scrubs, and node churn by construction.
//!
//! The replicated ledger and the peer-to-peer stream transport are
//! consumed as facades (`lattice_ledger::Ledger`,
//! [`transport::Transport`]); in-process implementations of both ship
//! for tests and single-process simulations.

pub mod alive;
pub mod config;
pub mod election;
pub mod error;
pub mod node;
pub mod registry;
pub mod transport;
pub mod tunnel;
pub mod types;

pub use alive::{available_nodes, live_peers, start_liveness, ScrubScheduler};
pub use config::{NodeConfig, DEFAULT_LIVENESS_TTL, SERVICE_PROTOCOL};
pub use election::elect_leader;
pub use error::LatticeError;
pub use node::Node;
pub use registry::{ServiceRecord, ServiceRegistry, UserRecord};
pub use transport::{memory::MemoryNetwork, InboundHandler, Transport, TunnelStream};
pub use tunnel::TunnelListener;
pub use types::{PeerId, HEALTHCHECK_BUCKET, SERVICES_BUCKET, USERS_BUCKET};

/// Stream/network facade consumed by the tunnel.
///
/// The real peer-to-peer transport (connectivity, multiplexing, peer
/// identity) is external; this module pins down the slice of it the
/// core needs: dial a named peer with a protocol tag, register a
/// handler for inbound streams, abort a stream abnormally.
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::LatticeError;
use crate::types::PeerId;

/// A bidirectional byte stream to a remote peer.
///
/// Dropping the stream closes it gracefully; [`reset`](TunnelStream::reset)
/// aborts it abnormally so the remote side observes an error rather
/// than EOF.
pub trait TunnelStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    fn reset(self: Box<Self>);
}

/// Handler invoked once per inbound stream for a protocol tag.
///
/// The handler is called with the remote peer's identity; long-running
/// work (the tunnel copy) is expected to be spawned, not run inline.
pub type InboundHandler = Arc<dyn Fn(PeerId, Box<dyn TunnelStream>) + Send + Sync>;

/// Peer-to-peer stream transport.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open an outbound stream to `peer` for `protocol`.
    async fn dial(
        &self,
        peer: &PeerId,
        protocol: &str,
    ) -> Result<Box<dyn TunnelStream>, LatticeError>;

    /// Register `handler` for inbound `protocol` streams, replacing any
    /// previous handler for that tag.
    fn handle_streams(&self, protocol: &str, handler: InboundHandler);
}

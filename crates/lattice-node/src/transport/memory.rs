/// In-process transport for tests and single-process simulations.
///
/// Every endpoint attached to one [`MemoryNetwork`] can dial every
/// other; streams are `tokio::io::duplex` pipes. Dialing a peer that
/// never attached fails the way an unreachable peer would. `reset`
/// degrades to an immediate close (a duplex pipe has no abnormal-abort
/// signal), which still terminates the remote copy on its next read.
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use crate::error::LatticeError;
use crate::transport::{InboundHandler, Transport, TunnelStream};
use crate::types::PeerId;

const STREAM_BUFFER: usize = 64 * 1024;

type Handlers = HashMap<PeerId, HashMap<String, InboundHandler>>;

#[derive(Clone, Default)]
pub struct MemoryNetwork {
    handlers: Arc<RwLock<Handlers>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `peer` to the network, returning its transport endpoint.
    pub fn endpoint(&self, peer: PeerId) -> MemoryTransport {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(peer.clone())
            .or_default();
        MemoryTransport {
            network: self.clone(),
            local: peer,
        }
    }
}

/// One peer's view of a [`MemoryNetwork`].
#[derive(Clone)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    local: PeerId,
}

impl MemoryTransport {
    pub fn peer_id(&self) -> &PeerId {
        &self.local
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn dial(
        &self,
        peer: &PeerId,
        protocol: &str,
    ) -> Result<Box<dyn TunnelStream>, LatticeError> {
        let handler = {
            let handlers = self
                .network
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let peer_handlers = handlers
                .get(peer)
                .ok_or_else(|| LatticeError::UnknownPeer(peer.clone()))?;
            peer_handlers
                .get(protocol)
                .cloned()
                .ok_or_else(|| LatticeError::UnknownProtocol {
                    peer_id: peer.clone(),
                    protocol: protocol.to_string(),
                })?
        };

        let (local_end, remote_end) = tokio::io::duplex(STREAM_BUFFER);
        handler(self.local.clone(), Box::new(MemoryStream(remote_end)));
        Ok(Box::new(MemoryStream(local_end)))
    }

    fn handle_streams(&self, protocol: &str, handler: InboundHandler) {
        self.network
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(self.local.clone())
            .or_default()
            .insert(protocol.to_string(), handler);
    }
}

struct MemoryStream(DuplexStream);

impl AsyncRead for MemoryStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

impl TunnelStream for MemoryStream {
    fn reset(self: Box<Self>) {
        // Dropping the pipe is the closest a duplex has to an abort.
        tracing::debug!("memory stream reset");
    }
}

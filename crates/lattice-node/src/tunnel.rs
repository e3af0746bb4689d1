/// Stream tunnel: bridges local TCP connections and peer tunnel
/// streams, gated by the service registry.
///
/// Exposing registers `service -> self` and serves inbound tunnel
/// streams into a local destination; connecting grants `self`, listens
/// locally, and forwards each accepted connection to the service
/// owner. Both sides share one full-duplex copy protocol.
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::NodeConfig;
use crate::error::LatticeError;
use crate::registry::ServiceRegistry;
use crate::transport::Transport;
use crate::types::PeerId;

/// Bridge two byte streams until either side stops.
///
/// Two one-direction copy tasks feed a completion channel with room
/// for both signals; the orchestrator takes the first signal only,
/// then aborts both tasks, dropping all stream halves and so closing
/// both endpoints (the surviving copy dies on its own read/write
/// error). Copy errors are discarded by policy: the tunnel surfaces
/// stream termination, never its cause.
pub(crate) async fn bridge<A, B>(a: A, b: B)
where
    A: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    B: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);
    let (done_tx, mut done_rx) = mpsc::channel::<()>(2);

    let tx = done_tx.clone();
    let forward = tokio::spawn(async move {
        let _ = tokio::io::copy(&mut a_read, &mut b_write).await;
        let _ = tx.send(()).await;
    });
    let backward = tokio::spawn(async move {
        let _ = tokio::io::copy(&mut b_read, &mut a_write).await;
        let _ = done_tx.send(()).await;
    });

    let _ = done_rx.recv().await;
    forward.abort();
    backward.abort();
}

/// Expose `service` on this node, forwarding inbound tunnel streams to
/// the local `dst_address` endpoint.
///
/// Publishes the service claim on a recurring timer and installs the
/// inbound stream handler. Inbound peers without a grant are reset
/// before any local dial happens. Returns the claim task's handle; it
/// runs until `cancel` fires.
pub(crate) fn expose(
    registry: ServiceRegistry,
    transport: Arc<dyn Transport>,
    local_id: PeerId,
    config: &NodeConfig,
    cancel: CancellationToken,
    service: String,
    dst_address: String,
) -> JoinHandle<()> {
    tracing::info!(service = %service, destination = %dst_address, "exposing service");

    let claim = registry.publish(
        cancel,
        config.announce_interval,
        service.clone(),
        local_id,
    );

    transport.handle_streams(
        &config.protocol,
        Arc::new(move |remote, stream| {
            let registry = registry.clone();
            let service = service.clone();
            let dst_address = dst_address.clone();
            tokio::spawn(async move {
                tracing::info!(service = %service, peer = %remote, "received tunnel stream");

                if !registry.is_granted(&remote) {
                    tracing::debug!(peer = %remote, "reset: peer not found in users ledger");
                    stream.reset();
                    return;
                }

                let local = match TcpStream::connect(&dst_address).await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::debug!(peer = %remote, error = %e, "reset: local dial failed");
                        stream.reset();
                        return;
                    }
                };

                bridge(stream, local).await;
                tracing::info!(service = %service, peer = %remote, "tunnel stream handled");
            });
        }),
    );

    claim
}

/// A bound tunnel listener serving [`connect`] traffic.
pub struct TunnelListener {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
    grant: JoinHandle<()>,
}

impl TunnelListener {
    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Join the accept loop and the grant task (both end when their
    /// token is cancelled).
    pub async fn join(self) {
        let _ = self.handle.await;
        let _ = self.grant.await;
    }
}

/// Connect to `service`: grant this node access, bind `listen_addr`,
/// and forward each accepted local connection to the service owner.
///
/// Binding is the only hard failure. The accept loop survives accept
/// errors and runs until `cancel` fires; in-flight tunnels drain on
/// their own stream termination.
pub(crate) async fn connect(
    registry: ServiceRegistry,
    transport: Arc<dyn Transport>,
    local_id: PeerId,
    config: &NodeConfig,
    cancel: CancellationToken,
    service: String,
    listen_addr: String,
) -> Result<TunnelListener, LatticeError> {
    let grant = registry.grant(cancel.clone(), config.announce_interval, local_id);

    let listener = TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| LatticeError::Bind {
            addr: listen_addr.clone(),
            source: e,
        })?;
    let local_addr = listener.local_addr().map_err(|e| LatticeError::Bind {
        addr: listen_addr.clone(),
        source: e,
    })?;
    tracing::info!(addr = %local_addr, service = %service, "bound local tunnel listener");

    let protocol = config.protocol.clone();
    let handle = tokio::spawn(async move {
        loop {
            let conn = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((conn, from)) => {
                        tracing::info!(from = %from, service = %service, "new local connection");
                        conn
                    }
                    Err(e) => {
                        // Accept errors are retriable; the listener survives.
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let registry = registry.clone();
            let transport = transport.clone();
            let service = service.clone();
            let protocol = protocol.clone();
            tokio::spawn(async move {
                let Some(record) = registry.resolve(&service) else {
                    tracing::debug!(service = %service, "service not found in ledger");
                    return;
                };

                let owner: PeerId = match record.peer_id.parse() {
                    Ok(peer) => peer,
                    Err(e) => {
                        tracing::debug!(owner = %record.peer_id, error = %e, "could not decode owner peer");
                        return;
                    }
                };

                let stream = match transport.dial(&owner, &protocol).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        tracing::debug!(peer = %owner, error = %e, "could not open tunnel stream");
                        return;
                    }
                };

                bridge(conn, stream).await;
                tracing::info!(service = %service, "done handling local connection");
            });
        }
    });

    Ok(TunnelListener {
        local_addr,
        handle,
        grant,
    })
}

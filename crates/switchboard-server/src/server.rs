//! WebSocket hub server: accept loop and connection admission.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use futures::SinkExt;
use switchboard_core::{peer_channel, Hub, REASON_ADDRESS_BANNED};
use switchboard_proto::HubMessage;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::session::{hub_msg_to_ws, run_session};
use crate::sweeper::spawn_sweeper;

/// Hub server accepting WebSocket connections from peers.
#[derive(Debug)]
pub struct HubServer {
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// The shared hub state behind its single mutex.
    hub: Arc<Mutex<Hub>>,
    /// Shutdown signal sender.
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl HubServer {
    /// Create a new hub server with the given configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let hub = Hub::new(config.admin_secret.clone(), config.ban_threshold);
        Self {
            config: Arc::new(config),
            hub: Arc::new(Mutex::new(hub)),
            shutdown_tx: None,
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get access to the shared hub state.
    #[must_use]
    pub fn hub(&self) -> Arc<Mutex<Hub>> {
        self.hub.clone()
    }

    /// Number of currently registered peers.
    pub async fn peer_count(&self) -> usize {
        self.hub.lock().await.registry().len()
    }

    /// Start the server and listen for connections.
    ///
    /// Runs until [`HubServer::shutdown`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn serve(&mut self, addr: SocketAddr) -> ServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        info!(addr = %addr, "hub server listening");

        spawn_sweeper(
            self.hub.clone(),
            self.config.sweep_interval,
            self.config.pairing_backoff,
        );

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            self.handle_connection(stream, peer_addr).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        info!("hub server shutting down");
        Ok(())
    }

    /// Handle a new TCP connection.
    async fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) {
        debug!(peer = %peer_addr, "new connection");

        let connected = self.peer_count().await;
        if connected >= self.config.max_connections {
            warn!(
                peer = %peer_addr,
                current = connected,
                max = self.config.max_connections,
                "connection rejected: max connections reached"
            );
            return;
        }

        let hub = self.hub.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            match serve_connection(stream, peer_addr, hub, config).await {
                Ok(()) => debug!(peer = %peer_addr, "connection closed"),
                Err(e) => debug!(peer = %peer_addr, error = %e, "connection ended with error"),
            }
        });
    }

    /// Trigger server shutdown. Best effort: a server that already
    /// stopped is a no-op.
    pub async fn shutdown(&self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(()).await;
        }
    }
}

/// Upgrade one TCP connection to WebSocket and run it to completion.
///
/// The admission check against the ban set runs before registration: a
/// banned address gets the terminal `banned` notification and an
/// immediate close, never obtaining a peer id.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: Arc<Mutex<Hub>>,
    config: Arc<ServerConfig>,
) -> ServerResult<()> {
    // Capture the client address during the handshake: proxy header
    // first, socket address as the fallback.
    let mut forwarded: Option<IpAddr> = None;
    let ws_stream = accept_hdr_async(stream, |req: &Request, response: Response| {
        forwarded = forwarded_ip(req.headers());
        Ok(response)
    })
    .await?;
    let client_addr = forwarded.unwrap_or_else(|| peer_addr.ip());

    let (tx, rx) = peer_channel(config.channel_capacity);
    let admitted = { hub.lock().await.admit(client_addr, tx) };

    match admitted {
        Ok(peer_id) => run_session(ws_stream, peer_id, hub, config, rx).await,
        Err(e) => {
            debug!(peer = %peer_addr, %client_addr, error = %e, "admission rejected");
            let mut ws_stream = ws_stream;
            let frame = hub_msg_to_ws(&HubMessage::banned(REASON_ADDRESS_BANNED))?;
            let _ = ws_stream.send(frame).await;
            let _ = ws_stream.close(None).await;
            Ok(())
        }
    }
}

/// First address listed in `X-Forwarded-For`, if present and parseable.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

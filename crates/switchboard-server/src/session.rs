//! Per-peer WebSocket session plumbing.
//!
//! Each connection runs one session: a read half that parses inbound
//! frames and routes them through the hub, and a write half that drains
//! the peer's outbound channel. The hub closing that channel (ban, sweep
//! eviction) ends the write half, which closes the socket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use switchboard_core::{Hub, Outbound, PeerReceiver};
use switchboard_proto::{ClientMessage, HubMessage, PeerId};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handlers::route_message;
use crate::pairing::spawn_pairing;

/// Something the read half learned from one WebSocket frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A parsed protocol message.
    Message(ClientMessage),
    /// The peer answered a liveness probe.
    Pong,
}

/// Decode one inbound WebSocket frame.
///
/// Ping frames are answered at the transport layer and carry no event;
/// a close frame surfaces as [`ServerError::ConnectionClosed`] so the
/// read loop can end.
///
/// # Errors
///
/// Returns `ServerError::Serialization` for frames that fail to parse;
/// the caller logs and drops those, keeping the connection.
pub fn process_ws_message(ws_msg: &WsMessage) -> ServerResult<Option<SessionEvent>> {
    match ws_msg {
        WsMessage::Text(text) => {
            let msg: ClientMessage = serde_json::from_str(text)?;
            Ok(Some(SessionEvent::Message(msg)))
        }
        WsMessage::Binary(data) => {
            let msg: ClientMessage = serde_json::from_slice(data)?;
            Ok(Some(SessionEvent::Message(msg)))
        }
        WsMessage::Ping(_) => Ok(None),
        WsMessage::Pong(_) => Ok(Some(SessionEvent::Pong)),
        WsMessage::Close(_) => {
            debug!("received close frame");
            Err(ServerError::ConnectionClosed)
        }
        WsMessage::Frame(_) => Ok(None),
    }
}

/// Serialize a hub message to a WebSocket text frame.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn hub_msg_to_ws(msg: &HubMessage) -> ServerResult<WsMessage> {
    let json = serde_json::to_string(msg)?;
    Ok(WsMessage::Text(json))
}

/// Turn an outbound frame into its WebSocket representation.
///
/// # Errors
///
/// Returns an error if a protocol message fails to serialize.
pub fn outbound_to_ws(frame: &Outbound) -> ServerResult<WsMessage> {
    match frame {
        Outbound::Message(msg) => hub_msg_to_ws(msg),
        Outbound::Probe => Ok(WsMessage::Ping(Vec::new())),
    }
}

/// Run the session loop for an admitted peer until the connection ends.
///
/// Always performs disconnect cleanup on the way out: registry and pool
/// removal cascade to departure broadcasts, and the remaining waiters are
/// re-settled by a fresh pairing run.
pub async fn run_session(
    ws_stream: WebSocketStream<TcpStream>,
    peer_id: PeerId,
    hub: Arc<Mutex<Hub>>,
    config: Arc<ServerConfig>,
    mut outbound_rx: PeerReceiver,
) -> ServerResult<()> {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    debug!(peer_id = %peer_id, "session started");

    let read_hub = hub.clone();
    let read_config = config.clone();
    let read_task = async move {
        while let Some(msg_result) = ws_stream.next().await {
            let ws_msg = match msg_result {
                Ok(msg) => msg,
                Err(e) => {
                    debug!(peer_id = %peer_id, error = %e, "websocket read error");
                    break;
                }
            };

            let event = match process_ws_message(&ws_msg) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(ServerError::ConnectionClosed) => break,
                Err(e) => {
                    // Malformed payload: drop the message, keep the peer.
                    warn!(peer_id = %peer_id, error = %e, "dropping malformed message");
                    continue;
                }
            };

            match event {
                SessionEvent::Pong => {
                    read_hub.lock().await.mark_alive(peer_id);
                }
                SessionEvent::Message(msg) => {
                    let pairing_needed = {
                        let mut hub = read_hub.lock().await;
                        route_message(peer_id, &msg, &mut hub)
                    };
                    if pairing_needed {
                        spawn_pairing(read_hub.clone(), read_config.pairing_backoff);
                    }
                }
            }
        }
    };

    let write_task = async move {
        while let Some(frame) = outbound_rx.recv().await {
            let ws_msg = match outbound_to_ws(&frame) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(peer_id = %peer_id, error = %e, "failed to serialize outbound frame");
                    continue;
                }
            };
            if ws_sink.send(ws_msg).await.is_err() {
                break;
            }
        }
        // The hub dropped our sender (ban or eviction) or the sink died:
        // either way the socket is done.
        let _ = ws_sink.send(WsMessage::Close(None)).await;
    };

    tokio::select! {
        () = read_task => {}
        () = write_task => {}
    }

    let removed = hub.lock().await.disconnect(peer_id);
    if removed {
        spawn_pairing(hub, config.pairing_backoff);
    }

    info!(peer_id = %peer_id, "session ended");
    Ok(())
}

//! Per-peer records and outbound channel plumbing.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use switchboard_proto::{HubMessage, PeerId};
use tokio::sync::mpsc;

/// Frames carried on a peer's outbound channel.
///
/// The session's write task turns `Message` into a serialized text frame
/// and `Probe` into a transport-level ping.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A protocol message for the peer.
    Message(HubMessage),
    /// A liveness probe; answered at the transport layer.
    Probe,
}

/// Sending half of a peer's outbound channel.
pub type PeerSender = mpsc::Sender<Outbound>;

/// Receiving half of a peer's outbound channel, owned by the write task.
pub type PeerReceiver = mpsc::Receiver<Outbound>;

/// Create a new outbound channel pair for a peer.
#[must_use]
pub fn peer_channel(buffer: usize) -> (PeerSender, PeerReceiver) {
    mpsc::channel(buffer)
}

/// A peer registered with the hub.
///
/// This record owns the peer's moderation attributes; nothing is ever
/// attached to the socket itself. The outbound sender is the peer's
/// channel handle: dropping the registry entry closes the channel, which
/// ends the peer's write task.
#[derive(Debug, Clone)]
pub struct RegisteredPeer {
    /// The peer's unique identifier.
    pub id: PeerId,
    /// Network origin, captured once at connection time.
    pub addr: IpAddr,
    /// Whether the peer has presented the admin secret. Never reverts.
    pub is_admin: bool,
    /// Liveness flag: true on construction and on every probe response,
    /// reset to pending by each sweep tick before probing.
    pub alive: bool,
    /// When the peer connected.
    pub connected_at: DateTime<Utc>,
    sender: PeerSender,
}

impl RegisteredPeer {
    /// Create a new peer record.
    #[must_use]
    pub fn new(id: PeerId, addr: IpAddr, sender: PeerSender) -> Self {
        Self {
            id,
            addr,
            is_admin: false,
            alive: true,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Whether the peer's channel is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue a message for the peer, fire-and-forget.
    ///
    /// Returns false if the channel is closed or full; the caller never
    /// waits on the remote peer.
    pub fn send(&self, msg: HubMessage) -> bool {
        self.sender.try_send(Outbound::Message(msg)).is_ok()
    }

    /// Queue a liveness probe, fire-and-forget.
    pub fn probe(&self) -> bool {
        self.sender.try_send(Outbound::Probe).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn local_addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    // ==================== RegisteredPeer Tests ====================

    #[test]
    fn test_new_peer_defaults() {
        let (tx, _rx) = peer_channel(4);
        let peer = RegisteredPeer::new(PeerId::new(), local_addr(), tx);

        assert!(!peer.is_admin);
        assert!(peer.alive);
        assert!(peer.is_open());
    }

    #[test]
    fn test_send_delivers_to_channel() {
        let (tx, mut rx) = peer_channel(4);
        let peer = RegisteredPeer::new(PeerId::new(), local_addr(), tx);

        assert!(peer.send(HubMessage::Requeue));
        assert!(matches!(
            rx.try_recv(),
            Ok(Outbound::Message(HubMessage::Requeue))
        ));
    }

    #[test]
    fn test_send_on_closed_channel_is_fire_and_forget() {
        let (tx, rx) = peer_channel(4);
        let peer = RegisteredPeer::new(PeerId::new(), local_addr(), tx);
        drop(rx);

        assert!(!peer.is_open());
        // Must not panic or block, just report the drop.
        assert!(!peer.send(HubMessage::Requeue));
    }

    #[test]
    fn test_send_on_full_channel_does_not_block() {
        let (tx, _rx) = peer_channel(1);
        let peer = RegisteredPeer::new(PeerId::new(), local_addr(), tx);

        assert!(peer.send(HubMessage::Requeue));
        assert!(!peer.send(HubMessage::Requeue));
    }

    #[test]
    fn test_probe_frame() {
        let (tx, mut rx) = peer_channel(4);
        let peer = RegisteredPeer::new(PeerId::new(), local_addr(), tx);

        assert!(peer.probe());
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
    }
}

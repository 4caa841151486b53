//! Protocol message definitions.
//!
//! Both directions use JSON envelopes tagged by a `type` field, with
//! kebab-case kind names on the wire (`admin-login`, `peer-disconnected`).
//! Signaling payloads (offer/answer/candidate) are opaque
//! [`serde_json::Value`]s: the hub routes them by `target` and never looks
//! inside.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{PeerId, PeerInfo};

/// Messages sent from a client to the hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Present the shared admin secret.
    AdminLogin {
        /// Candidate secret.
        password: String,
    },
    /// Enter the waiting pool.
    Join,
    /// Leave the waiting pool.
    Leave,
    /// Report another peer for abuse.
    Report {
        /// The peer being reported.
        reported_peer_id: PeerId,
    },
    /// WebRTC offer, relayed verbatim.
    Offer {
        /// Recipient.
        target: PeerId,
        /// Opaque SDP payload.
        payload: Value,
    },
    /// WebRTC answer, relayed verbatim.
    Answer {
        /// Recipient.
        target: PeerId,
        /// Opaque SDP payload.
        payload: Value,
    },
    /// ICE candidate, relayed verbatim.
    Candidate {
        /// Recipient.
        target: PeerId,
        /// Opaque candidate payload.
        payload: Value,
    },
    /// Chat text, relayed to the recipient.
    Chat {
        /// Recipient.
        target: PeerId,
        /// Chat text.
        message: String,
    },
    /// Force-ban a peer's address (admin only).
    AdminBan {
        /// The peer to ban.
        peer_id: PeerId,
    },
    /// Ask a peer for a screenshot (admin only).
    AdminScreenshotRequest {
        /// The peer to capture.
        peer_id: PeerId,
    },
    /// Screenshot data, relayed back to the requesting admin.
    ScreenshotResponse {
        /// The admin that asked for the capture.
        requester: PeerId,
        /// Encoded image data.
        screenshot: String,
    },
}

/// Messages sent from the hub to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HubMessage {
    /// Connection accepted; carries the assigned peer id.
    Connected {
        /// The id assigned to this connection.
        peer_id: PeerId,
    },
    /// Pairing succeeded; carries the partner's id.
    Matched {
        /// The partner peer.
        peer_id: PeerId,
    },
    /// Return to the waiting pool.
    Requeue,
    /// Terminal: the address is banned and the channel closes next.
    Banned {
        /// Human-readable reason.
        reason: String,
    },
    /// A peer left the hub.
    PeerDisconnected {
        /// The departed peer.
        peer_id: PeerId,
    },
    /// Full registry snapshot, sent to admins only.
    AdminUpdate {
        /// Every registered peer.
        peers: Vec<PeerInfo>,
    },
    /// Relayed WebRTC offer.
    Offer {
        /// Originating peer.
        from: PeerId,
        /// Opaque SDP payload, untouched.
        payload: Value,
    },
    /// Relayed WebRTC answer.
    Answer {
        /// Originating peer.
        from: PeerId,
        /// Opaque SDP payload, untouched.
        payload: Value,
    },
    /// Relayed ICE candidate.
    Candidate {
        /// Originating peer.
        from: PeerId,
        /// Opaque candidate payload, untouched.
        payload: Value,
    },
    /// Relayed chat text.
    Chat {
        /// Originating peer.
        from: PeerId,
        /// Chat text.
        message: String,
    },
    /// An admin wants a screenshot from this peer.
    ScreenshotRequest {
        /// The admin to answer.
        requester: PeerId,
    },
    /// Relayed screenshot data.
    ScreenshotResponse {
        /// The peer that produced the capture.
        from: PeerId,
        /// Encoded image data.
        screenshot: String,
    },
}

impl ClientMessage {
    /// Create an admin login message.
    #[must_use]
    pub fn admin_login(password: impl Into<String>) -> Self {
        Self::AdminLogin {
            password: password.into(),
        }
    }

    /// Create a report message.
    #[must_use]
    pub const fn report(reported_peer_id: PeerId) -> Self {
        Self::Report { reported_peer_id }
    }

    /// Create a chat message.
    #[must_use]
    pub fn chat(target: PeerId, message: impl Into<String>) -> Self {
        Self::Chat {
            target,
            message: message.into(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, crate::ProtoError> {
        serde_json::to_string(self).map_err(|e| crate::ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, crate::ProtoError> {
        serde_json::from_str(json).map_err(|e| crate::ProtoError::Decoding(e.to_string()))
    }
}

impl HubMessage {
    /// Create a connected notification.
    #[must_use]
    pub const fn connected(peer_id: PeerId) -> Self {
        Self::Connected { peer_id }
    }

    /// Create a matched notification.
    #[must_use]
    pub const fn matched(peer_id: PeerId) -> Self {
        Self::Matched { peer_id }
    }

    /// Create a banned notification.
    #[must_use]
    pub fn banned(reason: impl Into<String>) -> Self {
        Self::Banned {
            reason: reason.into(),
        }
    }

    /// Create a peer departure notification.
    #[must_use]
    pub const fn peer_disconnected(peer_id: PeerId) -> Self {
        Self::PeerDisconnected { peer_id }
    }

    /// Create an admin snapshot message.
    #[must_use]
    pub const fn admin_update(peers: Vec<PeerInfo>) -> Self {
        Self::AdminUpdate { peers }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, crate::ProtoError> {
        serde_json::to_string(self).map_err(|e| crate::ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, crate::ProtoError> {
        serde_json::from_str(json).map_err(|e| crate::ProtoError::Decoding(e.to_string()))
    }
}

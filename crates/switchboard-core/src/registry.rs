//! Connection registry: the authoritative map of live peers.

use std::collections::HashMap;
use std::net::IpAddr;

use switchboard_proto::{PeerId, PeerInfo};

use crate::peer::{PeerSender, RegisteredPeer};

/// Registry mapping peer ids to live peer records.
///
/// A peer exists here iff its channel is considered open; the waiting pool
/// only ever references ids present in this map. The registry is a pure
/// store: pushing admin snapshots after mutations is the caller's job.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, RegisteredPeer>,
}

impl PeerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
        }
    }

    /// Allocate a fresh id and insert a peer record for it.
    ///
    /// The admission check against the ban set happens before this call;
    /// a banned address never reaches the registry.
    pub fn insert(&mut self, addr: IpAddr, sender: PeerSender) -> PeerId {
        let id = PeerId::new();
        self.peers.insert(id, RegisteredPeer::new(id, addr, sender));
        id
    }

    /// Get a reference to a registered peer.
    #[must_use]
    pub fn get(&self, id: PeerId) -> Option<&RegisteredPeer> {
        self.peers.get(&id)
    }

    /// Get a mutable reference to a registered peer.
    #[must_use]
    pub fn get_mut(&mut self, id: PeerId) -> Option<&mut RegisteredPeer> {
        self.peers.get_mut(&id)
    }

    /// Remove a peer. Idempotent: removing an absent id is a no-op.
    pub fn remove(&mut self, id: PeerId) -> Option<RegisteredPeer> {
        self.peers.remove(&id)
    }

    /// Whether the id is registered.
    #[must_use]
    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Number of registered peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate over all registered peers.
    pub fn peers(&self) -> impl Iterator<Item = &RegisteredPeer> {
        self.peers.values()
    }

    /// Iterate mutably over all registered peers.
    pub fn peers_mut(&mut self) -> impl Iterator<Item = &mut RegisteredPeer> {
        self.peers.values_mut()
    }

    /// Iterate over peers flagged as admin.
    pub fn admins(&self) -> impl Iterator<Item = &RegisteredPeer> {
        self.peers.values().filter(|p| p.is_admin)
    }

    /// Build the `{peer_id, addr}` snapshot pushed to admins.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        self.peers
            .values()
            .map(|p| PeerInfo::new(p.id, p.addr))
            .collect()
    }
}

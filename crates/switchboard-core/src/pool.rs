//! Waiting pool: insertion-ordered set of peers seeking a partner.

use std::collections::VecDeque;

use switchboard_proto::PeerId;

/// Insertion-ordered set of peer ids eligible for pairing.
///
/// Order is load-bearing: pairing always selects the two longest-waiting
/// ids, so enqueue order decides who gets matched first.
#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<PeerId>,
}

impl WaitingPool {
    /// Create a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Add a peer to the back of the pool.
    ///
    /// Returns false if the peer is already waiting; a peer holds at most
    /// one pool slot regardless of how many join/requeue events fire.
    pub fn enqueue(&mut self, id: PeerId) -> bool {
        if self.queue.contains(&id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// Remove a peer from the pool. Idempotent.
    pub fn remove(&mut self, id: PeerId) -> bool {
        if let Some(pos) = self.queue.iter().position(|&p| p == id) {
            self.queue.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether the peer is currently waiting.
    #[must_use]
    pub fn contains(&self, id: PeerId) -> bool {
        self.queue.contains(&id)
    }

    /// The two oldest-waiting ids, without removing them.
    ///
    /// Selection is strict insertion order, never random, which makes
    /// pairing fair and deterministic.
    #[must_use]
    pub fn oldest_pair(&self) -> Option<(PeerId, PeerId)> {
        match (self.queue.front(), self.queue.get(1)) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Number of waiting peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate over waiting ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.queue.iter().copied()
    }
}

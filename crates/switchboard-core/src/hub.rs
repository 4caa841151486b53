//! The hub: every lifecycle, pairing, and moderation operation over the
//! shared state.
//!
//! All four shared structures (registry, waiting pool, report ledger, ban
//! set) live inside one [`Hub`] value. Callers wrap it in a single
//! `Arc<Mutex<..>>`; that mutex is the only serialization boundary in the
//! system. Every send to a peer is a non-blocking `try_send`; no
//! operation ever waits on a remote peer.

use std::net::IpAddr;

use switchboard_proto::{HubMessage, PeerId};
use tracing::{debug, info, warn};

use crate::error::HubError;
use crate::moderation::{ReportLedger, ReportOutcome};
use crate::peer::{PeerSender, RegisteredPeer};
use crate::pool::WaitingPool;
use crate::registry::PeerRegistry;

/// Ban reason sent when an address crosses the report threshold.
pub const REASON_REPORT_THRESHOLD: &str = "banned after repeated reports";

/// Ban reason sent when an admin force-bans a peer.
pub const REASON_ADMIN_BAN: &str = "removed by admin";

/// Reason sent to a connection attempt from an already-banned address.
pub const REASON_ADDRESS_BANNED: &str = "address is banned";

/// Result of one pairing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// The two oldest waiters were matched and notified.
    Paired(PeerId, PeerId),
    /// One or both candidates were stale; the listed ids were reclaimed
    /// from the pool. The caller retries after its backoff.
    Stale(Vec<PeerId>),
    /// Fewer than two peers waiting; nothing to do.
    Insufficient,
}

/// Result of handling a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportResult {
    /// The reported address crossed the threshold; the peer was banned
    /// and purged. The reporter is not auto-requeued in this branch.
    ReportedBanned,
    /// Below the threshold: reported and reporter both returned to the
    /// pool.
    BothRequeued,
    /// The reported peer was already gone; only the reporter was
    /// requeued.
    ReporterRequeued,
}

/// Shared hub state and the operations over it.
#[derive(Debug)]
pub struct Hub {
    registry: PeerRegistry,
    pool: WaitingPool,
    ledger: ReportLedger,
    admin_secret: String,
}

impl Hub {
    /// Create a hub with the given admin secret and report-ban threshold.
    #[must_use]
    pub fn new(admin_secret: impl Into<String>, ban_threshold: u32) -> Self {
        Self {
            registry: PeerRegistry::new(),
            pool: WaitingPool::new(),
            ledger: ReportLedger::new(ban_threshold),
            admin_secret: admin_secret.into(),
        }
    }

    /// The connection registry.
    #[must_use]
    pub const fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// The waiting pool.
    #[must_use]
    pub const fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    /// The moderation ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ReportLedger {
        &self.ledger
    }

    // ==================== Lifecycle ====================

    /// Admit a new connection.
    ///
    /// The ban check runs before anything else: a banned address is
    /// rejected without ever obtaining a peer id. Otherwise the peer is
    /// registered, told its id via `connected`, and admins get a fresh
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Banned`] if the address is on the ban set; the
    /// caller sends the terminal `banned` notification and closes the
    /// channel itself, since no registry entry exists to do it through.
    pub fn admit(&mut self, addr: IpAddr, sender: PeerSender) -> Result<PeerId, HubError> {
        if self.ledger.is_banned(addr) {
            warn!(%addr, "rejected connection from banned address");
            return Err(HubError::Banned(addr));
        }

        let id = self.registry.insert(addr, sender);
        if let Some(peer) = self.registry.get(id) {
            peer.send(HubMessage::connected(id));
        }
        info!(peer_id = %id, %addr, "peer connected");
        self.broadcast_admin_snapshot();
        Ok(id)
    }

    /// Remove a peer after its connection closed.
    ///
    /// Cascades to pool removal, a `peer-disconnected` broadcast to
    /// everyone left, and an admin snapshot. Idempotent: a peer already
    /// cleaned up (ban, sweep) is a no-op.
    pub fn disconnect(&mut self, id: PeerId) -> bool {
        let removed = self.registry.remove(id).is_some();
        self.pool.remove(id);
        if removed {
            info!(peer_id = %id, "peer disconnected");
            self.broadcast_peer_departed(id);
            self.broadcast_admin_snapshot();
        }
        removed
    }

    /// Record a liveness response for a peer.
    pub fn mark_alive(&mut self, id: PeerId) {
        if let Some(peer) = self.registry.get_mut(id) {
            peer.alive = true;
        }
    }

    // ==================== Pool membership ====================

    /// Put a peer into the waiting pool.
    ///
    /// Returns false for unknown ids: a message from a closing
    /// connection is a no-op, not an error. The caller schedules a
    /// pairing run on true.
    pub fn join(&mut self, id: PeerId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        self.pool.enqueue(id);
        debug!(peer_id = %id, pool = self.pool.len(), "joined waiting pool");
        self.broadcast_admin_snapshot();
        true
    }

    /// Take a peer out of the waiting pool.
    pub fn leave(&mut self, id: PeerId) {
        if self.pool.remove(id) {
            debug!(peer_id = %id, "left waiting pool");
            self.broadcast_admin_snapshot();
        }
    }

    // ==================== Pairing ====================

    /// Try to pair the two longest-waiting peers.
    ///
    /// A pair is valid only if both ids still resolve to open channels.
    /// Stale entries are reclaimed from the pool and reported back so the
    /// caller can retry after its backoff; the pool only ever shrinks
    /// here, which bounds the retry loop.
    pub fn attempt_pairing(&mut self) -> PairingOutcome {
        let Some((a, b)) = self.pool.oldest_pair() else {
            return PairingOutcome::Insufficient;
        };

        let a_ok = self.registry.get(a).is_some_and(RegisteredPeer::is_open);
        let b_ok = self.registry.get(b).is_some_and(RegisteredPeer::is_open);

        if a_ok && b_ok {
            if let Some(peer) = self.registry.get(a) {
                peer.send(HubMessage::matched(b));
            }
            if let Some(peer) = self.registry.get(b) {
                peer.send(HubMessage::matched(a));
            }
            self.pool.remove(a);
            self.pool.remove(b);
            info!(peer_a = %a, peer_b = %b, "peers matched");
            self.broadcast_admin_snapshot();
            return PairingOutcome::Paired(a, b);
        }

        let mut stale = Vec::new();
        if !a_ok {
            self.pool.remove(a);
            stale.push(a);
        }
        if !b_ok {
            self.pool.remove(b);
            stale.push(b);
        }
        debug!(reclaimed = stale.len(), "stale pool entries reclaimed");
        PairingOutcome::Stale(stale)
    }

    // ==================== Moderation ====================

    /// Present the admin secret. A match flips `is_admin` (never
    /// reverted) and pushes a snapshot so the new admin sees the
    /// population immediately. A mismatch is silently ignored.
    pub fn admin_login(&mut self, id: PeerId, password: &str) -> bool {
        if password != self.admin_secret {
            debug!(peer_id = %id, "admin login rejected");
            return false;
        }
        let Some(peer) = self.registry.get_mut(id) else {
            return false;
        };
        peer.is_admin = true;
        info!(peer_id = %id, "admin login");
        self.broadcast_admin_snapshot();
        true
    }

    /// Handle a report from `reporter` against `reported`.
    ///
    /// Counts are keyed by the reported peer's address. At the threshold
    /// the peer is banned, notified, and purged; below it, both parties
    /// are requeued. A report against an unknown id still requeues the
    /// reporter. The caller schedules a pairing run in every branch.
    pub fn report(&mut self, reporter: PeerId, reported: PeerId) -> ReportResult {
        let Some(target) = self.registry.get(reported) else {
            debug!(peer_id = %reported, "report against unknown peer");
            self.requeue(reporter);
            self.broadcast_admin_snapshot();
            return ReportResult::ReporterRequeued;
        };
        let target_addr = target.addr;

        match self.ledger.record_report(target_addr) {
            ReportOutcome::Banned => {
                info!(peer_id = %reported, addr = %target_addr, "report threshold reached, banning");
                self.expel(reported, REASON_REPORT_THRESHOLD);
                self.broadcast_admin_snapshot();
                ReportResult::ReportedBanned
            }
            ReportOutcome::Requeue { count } => {
                debug!(peer_id = %reported, addr = %target_addr, count, "report recorded");
                self.requeue(reported);
                self.requeue(reporter);
                self.broadcast_admin_snapshot();
                ReportResult::BothRequeued
            }
        }
    }

    /// Force-ban a peer's address on behalf of an admin.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unauthorized`] when the caller is not an
    /// admin and [`HubError::NotFound`] when either id is unknown. The
    /// message handler logs and swallows both; a failed admin op never
    /// feeds back to the sender.
    pub fn admin_ban(&mut self, caller: PeerId, target: PeerId) -> Result<(), HubError> {
        self.require_admin(caller)?;
        let addr = self
            .registry
            .get(target)
            .map(|p| p.addr)
            .ok_or(HubError::NotFound(target))?;

        self.ledger.ban(addr);
        info!(peer_id = %target, %addr, admin = %caller, "admin ban");
        self.expel(target, REASON_ADMIN_BAN);
        self.broadcast_admin_snapshot();
        Ok(())
    }

    /// Relay a screenshot request from an admin to a target peer.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unauthorized`] when the caller is not an
    /// admin. An unknown target is a silent drop, like any relay.
    pub fn screenshot_request(&self, caller: PeerId, target: PeerId) -> Result<(), HubError> {
        self.require_admin(caller)?;
        self.relay(target, HubMessage::ScreenshotRequest { requester: caller });
        Ok(())
    }

    /// Relay screenshot data back to the requesting admin.
    ///
    /// Delivered only if the requester still resolves to a live peer with
    /// the admin flag; anything else is dropped.
    pub fn screenshot_response(&self, from: PeerId, requester: PeerId, screenshot: String) {
        match self.registry.get(requester) {
            Some(peer) if peer.is_admin && peer.is_open() => {
                peer.send(HubMessage::ScreenshotResponse { from, screenshot });
            }
            _ => debug!(peer_id = %requester, "screenshot response dropped, requester not a live admin"),
        }
    }

    // ==================== Relay ====================

    /// Forward a message to the addressed recipient if its channel is
    /// open. Absent or closed recipients are a silent drop by design:
    /// no error feedback to the sender, no retry.
    pub fn relay(&self, target: PeerId, msg: HubMessage) -> bool {
        match self.registry.get(target) {
            Some(peer) if peer.is_open() => peer.send(msg),
            _ => {
                debug!(peer_id = %target, "relay target absent or closed, dropping");
                false
            }
        }
    }

    // ==================== Liveness ====================

    /// One sweep tick.
    ///
    /// Evicts every peer whose channel is closed or whose previous probe
    /// went unanswered, then resets the survivors to pending and probes
    /// them. Evicted peers get no further notification; everyone else
    /// learns of the departures. Returns the evicted ids so the caller
    /// can schedule a pairing run when the pool changed.
    pub fn sweep(&mut self) -> Vec<PeerId> {
        let evicted: Vec<PeerId> = self
            .registry
            .peers()
            .filter(|p| !p.is_open() || !p.alive)
            .map(|p| p.id)
            .collect();

        for peer in self.registry.peers_mut() {
            if !evicted.contains(&peer.id) {
                peer.alive = false;
                peer.probe();
            }
        }

        for &id in &evicted {
            self.registry.remove(id);
            self.pool.remove(id);
            info!(peer_id = %id, "evicted unresponsive peer");
        }
        for &id in &evicted {
            self.broadcast_peer_departed(id);
        }
        if !evicted.is_empty() {
            self.broadcast_admin_snapshot();
        }
        evicted
    }

    // ==================== Broadcasts ====================

    /// Push the full registry snapshot to every admin.
    ///
    /// Always the full list, never a delta: the population is small and
    /// broadcasts are rare next to connection lifetimes.
    pub fn broadcast_admin_snapshot(&self) {
        let snapshot = self.registry.snapshot();
        for admin in self.registry.admins() {
            admin.send(HubMessage::admin_update(snapshot.clone()));
        }
    }

    /// Tell every remaining peer that `departed` left.
    pub fn broadcast_peer_departed(&self, departed: PeerId) {
        for peer in self.registry.peers() {
            peer.send(HubMessage::peer_disconnected(departed));
        }
    }

    // ==================== Internals ====================

    /// Requeue a peer if it is still registered with an open channel.
    fn requeue(&mut self, id: PeerId) {
        let open = self.registry.get(id).is_some_and(RegisteredPeer::is_open);
        if open {
            if let Some(peer) = self.registry.get(id) {
                peer.send(HubMessage::Requeue);
            }
            self.pool.enqueue(id);
        }
    }

    /// Send the terminal `banned` notification and purge the peer.
    ///
    /// Dropping the registry entry drops the outbound sender, which ends
    /// the peer's write task once the queued notification has drained.
    fn expel(&mut self, id: PeerId, reason: &str) {
        if let Some(peer) = self.registry.get(id) {
            peer.send(HubMessage::banned(reason));
        }
        self.registry.remove(id);
        self.pool.remove(id);
        self.broadcast_peer_departed(id);
    }

    fn require_admin(&self, caller: PeerId) -> Result<(), HubError> {
        match self.registry.get(caller) {
            Some(peer) if peer.is_admin => Ok(()),
            Some(_) => Err(HubError::Unauthorized(caller)),
            None => Err(HubError::NotFound(caller)),
        }
    }
}

//! # switchboard-core
//!
//! Shared state and the peer lifecycle state machine for the switchboard
//! hub:
//!
//! - [`PeerRegistry`] - the authoritative map of live peers
//! - [`WaitingPool`] - insertion-ordered set of peers seeking a partner
//! - [`ReportLedger`] - per-address report counts and the ban set
//! - [`Hub`] - every pairing, relay, and moderation operation, designed
//!   to sit behind a single mutex

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hub;
pub mod moderation;
pub mod peer;
pub mod pool;
pub mod registry;

pub use error::HubError;
pub use hub::{
    Hub, PairingOutcome, ReportResult, REASON_ADDRESS_BANNED, REASON_ADMIN_BAN,
    REASON_REPORT_THRESHOLD,
};
pub use moderation::{ReportLedger, ReportOutcome};
pub use peer::{peer_channel, Outbound, PeerReceiver, PeerSender, RegisteredPeer};
pub use pool::WaitingPool;
pub use registry::PeerRegistry;

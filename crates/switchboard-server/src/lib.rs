//! # switchboard-server
//!
//! WebSocket hub server for switchboard peer pairing and relay.
//!
//! Clients connect over WebSocket, receive an opaque peer id, and opt
//! into a waiting pool. The hub pairs the two longest-waiting peers,
//! relays their signaling and chat traffic verbatim, and enforces the
//! moderation rules (report-threshold bans, admin force-bans).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐      WebSocket      ┌──────────────────┐
//! │  client  │◄───────────────────►│    HubServer     │
//! └──────────┘                     │                  │
//!                                  │  ┌────────────┐  │
//! ┌──────────┐                     │  │    Hub     │  │
//! │  client  │◄───────────────────►│  │ (registry, │  │
//! └──────────┘                     │  │ pool,      │  │
//!                                  │  │ ledger)    │  │
//! ┌──────────┐                     │  └────────────┘  │
//! │  admin   │◄───────────────────►│   one mutex      │
//! └──────────┘                     └──────────────────┘
//! ```
//!
//! Every session, the pairing task, and the sweeper serialize on the one
//! hub mutex; sends to peers are fire-and-forget channel pushes drained
//! by each session's write half.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod pairing;
pub mod server;
pub mod session;
pub mod sweeper;

pub use config::{
    ServerConfig, DEFAULT_ADMIN_SECRET, DEFAULT_BAN_THRESHOLD, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_PAIRING_BACKOFF, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL,
};
pub use error::{ServerError, ServerResult};
pub use handlers::route_message;
pub use pairing::spawn_pairing;
pub use server::HubServer;
pub use session::{hub_msg_to_ws, outbound_to_ws, process_ws_message, run_session, SessionEvent};
pub use sweeper::spawn_sweeper;

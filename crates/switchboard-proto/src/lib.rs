//! # switchboard-proto
//!
//! Protocol definitions for switchboard client-hub communication.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod messages;
pub mod types;

pub use error::ProtoError;
pub use messages::{ClientMessage, HubMessage};
pub use types::{PeerId, PeerInfo};

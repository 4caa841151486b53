//! Error types for hub operations.

use std::net::IpAddr;

use switchboard_proto::PeerId;
use thiserror::Error;

/// Errors that can occur during hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The address is on the ban set; the connection must be rejected
    /// before a peer id is ever allocated.
    #[error("address {0} is banned")]
    Banned(IpAddr),

    /// The peer is not registered.
    #[error("peer {0} not found")]
    NotFound(PeerId),

    /// The caller is not an admin; the operation is ignored.
    #[error("peer {0} is not authorized")]
    Unauthorized(PeerId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_banned_display() {
        let err = HubError::Banned(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)));
        assert!(err.to_string().contains("10.0.0.9"));
        assert!(err.to_string().contains("banned"));
    }

    #[test]
    fn test_not_found_display() {
        let id = PeerId::new();
        let err = HubError::NotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_unauthorized_display() {
        let id = PeerId::new();
        let err = HubError::Unauthorized(id);
        assert!(err.to_string().contains("not authorized"));
    }
}

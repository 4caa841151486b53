//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listening port, overridden by the `PORT` environment variable.
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of reports that bans an address.
pub const DEFAULT_BAN_THRESHOLD: u32 = 10;

/// Default liveness sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default backoff between pairing retries while stale entries are
/// being reclaimed.
pub const DEFAULT_PAIRING_BACKOFF: Duration = Duration::from_secs(1);

/// Default per-peer outbound channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default maximum number of concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;

/// Fallback admin secret for local testing; deployments override it via
/// the environment.
pub const DEFAULT_ADMIN_SECRET: &str = "secret123";

/// Configuration for the hub server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the WebSocket server to.
    pub bind_addr: SocketAddr,
    /// Shared secret for admin logins.
    pub admin_secret: String,
    /// Cumulative reports against an address before it is banned.
    pub ban_threshold: u32,
    /// Period of the liveness sweeper.
    pub sweep_interval: Duration,
    /// Backoff between pairing retries.
    pub pairing_backoff: Duration,
    /// Capacity of each peer's outbound channel.
    pub channel_capacity: usize,
    /// Maximum number of concurrent connections.
    pub max_connections: usize,
}

impl ServerConfig {
    /// Create a new server configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            admin_secret: DEFAULT_ADMIN_SECRET.to_string(),
            ban_threshold: DEFAULT_BAN_THRESHOLD,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            pairing_backoff: DEFAULT_PAIRING_BACKOFF,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Set the admin secret.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.admin_secret = secret.into();
        self
    }

    /// Set the report-count ban threshold.
    #[must_use]
    pub const fn with_ban_threshold(mut self, threshold: u32) -> Self {
        self.ban_threshold = threshold;
        self
    }

    /// Set the liveness sweep period.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the pairing retry backoff.
    #[must_use]
    pub const fn with_pairing_backoff(mut self, backoff: Duration) -> Self {
        self.pairing_backoff = backoff;
        self
    }

    /// Set the per-peer outbound channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(([0, 0, 0, 0], DEFAULT_PORT).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    // ==================== Construction Tests ====================

    #[test]
    fn test_config_new_uses_defaults() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9000);
        let config = ServerConfig::new(addr);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.admin_secret, DEFAULT_ADMIN_SECRET);
        assert_eq!(config.ban_threshold, DEFAULT_BAN_THRESHOLD);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert_eq!(config.pairing_backoff, DEFAULT_PAIRING_BACKOFF);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_config_default_bind_addr() {
        let config = ServerConfig::default();
        assert_eq!(
            config.bind_addr,
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
        );
    }

    // ==================== Builder Tests ====================

    #[test]
    fn test_builder_chaining() {
        let config = ServerConfig::default()
            .with_admin_secret("hunter2")
            .with_ban_threshold(3)
            .with_sweep_interval(Duration::from_secs(5))
            .with_pairing_backoff(Duration::from_millis(100))
            .with_channel_capacity(16)
            .with_max_connections(50);

        assert_eq!(config.admin_secret, "hunter2");
        assert_eq!(config.ban_threshold, 3);
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.pairing_backoff, Duration::from_millis(100));
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.max_connections, 50);
    }

    #[test]
    fn test_config_clone() {
        let config = ServerConfig::default().with_ban_threshold(7);
        let cloned = config.clone();

        assert_eq!(config.ban_threshold, cloned.ban_threshold);
        assert_eq!(config.bind_addr, cloned.bind_addr);
    }
}

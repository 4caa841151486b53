//! Switchboard hub server binary.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use switchboard_server::{HubServer, ServerConfig, DEFAULT_ADMIN_SECRET, DEFAULT_PORT};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Peer-pairing and message-relay hub.
#[derive(Debug, Parser)]
#[command(name = "switchboard", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Shared secret for admin logins.
    #[arg(long, env = "ADMIN_PASSWORD", default_value = DEFAULT_ADMIN_SECRET)]
    admin_secret: String,

    /// Cumulative reports against an address before it is banned.
    #[arg(long, env = "BAN_THRESHOLD", default_value_t = 10)]
    ban_threshold: u32,

    /// Liveness sweep period in seconds.
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 30)]
    sweep_interval_secs: u64,

    /// Backoff between pairing retries in milliseconds.
    #[arg(long, env = "PAIRING_BACKOFF_MS", default_value_t = 1000)]
    pairing_backoff_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let bind_addr = SocketAddr::new(args.host, args.port);

    let config = ServerConfig::new(bind_addr)
        .with_admin_secret(args.admin_secret)
        .with_ban_threshold(args.ban_threshold)
        .with_sweep_interval(Duration::from_secs(args.sweep_interval_secs))
        .with_pairing_backoff(Duration::from_millis(args.pairing_backoff_ms));

    info!("starting switchboard hub on {bind_addr}");
    info!("  clients connect via: ws://{bind_addr}/");

    let mut server = HubServer::new(config);
    if let Err(e) = server.serve(bind_addr).await {
        error!("hub server error: {e}");
        std::process::exit(1);
    }
}

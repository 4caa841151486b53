//! The scheduled pairing task.

use std::sync::Arc;
use std::time::Duration;

use switchboard_core::{Hub, PairingOutcome};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Run the pairing engine until it settles.
///
/// One attempt per round, sleeping the fixed backoff between rounds
/// while stale pool entries are being reclaimed. Every stale round
/// shrinks the pool by at least one entry, so the loop terminates; a
/// successful pairing or an undersized pool ends the run immediately.
///
/// The hub lock is held only for the attempt itself, never across the
/// backoff sleep.
pub fn spawn_pairing(hub: Arc<Mutex<Hub>>, backoff: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let outcome = hub.lock().await.attempt_pairing();
            match outcome {
                PairingOutcome::Paired(a, b) => {
                    debug!(peer_a = %a, peer_b = %b, "pairing run settled");
                    break;
                }
                PairingOutcome::Insufficient => break,
                PairingOutcome::Stale(_) => tokio::time::sleep(backoff).await,
            }
        }
    })
}

//! The periodic liveness sweeper task.

use std::sync::Arc;
use std::time::Duration;

use switchboard_core::Hub;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::pairing::spawn_pairing;

/// Probe every registered peer on a fixed period and evict the ones
/// whose channel is closed or whose previous probe went unanswered.
///
/// This is the only mechanism that reclaims connections that never
/// cleanly signal closure. Evictions shrink the pool, so a pairing run
/// is scheduled to re-settle the remaining waiters.
pub fn spawn_sweeper(
    hub: Arc<Mutex<Hub>>,
    period: Duration,
    pairing_backoff: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = hub.lock().await.sweep();
            if !evicted.is_empty() {
                debug!(evicted = evicted.len(), "sweep evicted unresponsive peers");
                spawn_pairing(hub.clone(), pairing_backoff);
            }
        }
    })
}

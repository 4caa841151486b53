//! Message handlers: dispatching inbound messages to hub operations.

use switchboard_core::Hub;
use switchboard_proto::{ClientMessage, HubMessage, PeerId};
use tracing::debug;

/// Route an inbound message from `sender` to the right hub operation.
///
/// Returns true when the pool may have gained members and a pairing run
/// should be scheduled. Unauthorized admin operations and relays to
/// unknown recipients are swallowed here: the sender never gets error
/// feedback, by design.
pub fn route_message(sender: PeerId, msg: &ClientMessage, hub: &mut Hub) -> bool {
    // A connection that was already purged (ban, sweep eviction) may
    // still have frames in flight; they are no-ops, not errors.
    if !hub.registry().contains(sender) {
        debug!(peer_id = %sender, "message from unregistered connection ignored");
        return false;
    }

    match msg {
        ClientMessage::AdminLogin { password } => {
            hub.admin_login(sender, password);
            false
        }
        ClientMessage::Join => hub.join(sender),
        ClientMessage::Leave => {
            hub.leave(sender);
            false
        }
        ClientMessage::Report { reported_peer_id } => {
            // Pairing is re-invoked after every report outcome.
            hub.report(sender, *reported_peer_id);
            true
        }
        ClientMessage::Offer { target, payload } => {
            hub.relay(
                *target,
                HubMessage::Offer {
                    from: sender,
                    payload: payload.clone(),
                },
            );
            false
        }
        ClientMessage::Answer { target, payload } => {
            hub.relay(
                *target,
                HubMessage::Answer {
                    from: sender,
                    payload: payload.clone(),
                },
            );
            false
        }
        ClientMessage::Candidate { target, payload } => {
            hub.relay(
                *target,
                HubMessage::Candidate {
                    from: sender,
                    payload: payload.clone(),
                },
            );
            false
        }
        ClientMessage::Chat { target, message } => {
            hub.relay(
                *target,
                HubMessage::Chat {
                    from: sender,
                    message: message.clone(),
                },
            );
            false
        }
        ClientMessage::AdminBan { peer_id } => {
            if let Err(e) = hub.admin_ban(sender, *peer_id) {
                debug!(peer_id = %sender, error = %e, "admin ban ignored");
                return false;
            }
            // A departure can leave an odd waiter behind; let the engine
            // re-settle the pool.
            true
        }
        ClientMessage::AdminScreenshotRequest { peer_id } => {
            if let Err(e) = hub.screenshot_request(sender, *peer_id) {
                debug!(peer_id = %sender, error = %e, "screenshot request ignored");
            }
            false
        }
        ClientMessage::ScreenshotResponse {
            requester,
            screenshot,
        } => {
            hub.screenshot_response(sender, *requester, screenshot.clone());
            false
        }
    }
}

//! Integration tests for the peer lifecycle: pairing, moderation, and
//! relay flows over a single hub.

use std::net::{IpAddr, Ipv4Addr};

use proptest::prelude::*;
use switchboard_core::{peer_channel, Hub, Outbound, PairingOutcome, PeerReceiver, ReportResult};
use switchboard_proto::{HubMessage, PeerId};

// ==================== Helper Functions ====================

const SECRET: &str = "secret123";
const THRESHOLD: u32 = 10;

fn make_hub() -> Hub {
    Hub::new(SECRET, THRESHOLD)
}

fn addr(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

fn connect(hub: &mut Hub, last: u8) -> (PeerId, PeerReceiver) {
    let (tx, rx) = peer_channel(64);
    let id = hub.admit(addr(last), tx).expect("admit in test setup");
    (id, rx)
}

fn drain(rx: &mut PeerReceiver) -> Vec<HubMessage> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Outbound::Message(msg) = frame {
            out.push(msg);
        }
    }
    out
}

fn pair_until_settled(hub: &mut Hub) -> Vec<(PeerId, PeerId)> {
    let mut pairs = Vec::new();
    loop {
        match hub.attempt_pairing() {
            PairingOutcome::Paired(a, b) => pairs.push((a, b)),
            PairingOutcome::Stale(_) => {}
            PairingOutcome::Insufficient => break,
        }
    }
    pairs
}

// ==================== Pairing Fairness ====================

#[test]
fn test_n_joins_pair_oldest_first() {
    let mut hub = make_hub();
    let mut ids = Vec::new();
    for i in 0..6 {
        let (id, rx) = connect(&mut hub, i);
        hub.join(id);
        ids.push((id, rx));
    }

    for expected in ids.chunks(2) {
        let before = hub.pool().len();
        match hub.attempt_pairing() {
            PairingOutcome::Paired(a, b) => {
                assert_eq!((a, b), (expected[0].0, expected[1].0));
                assert_eq!(hub.pool().len(), before - 2);
            }
            other => panic!("expected a pairing, got {other:?}"),
        }
    }
    assert!(hub.pool().is_empty());
}

#[test]
fn test_matched_notifications_cross_reference() {
    let mut hub = make_hub();
    let (a, mut arx) = connect(&mut hub, 1);
    let (b, mut brx) = connect(&mut hub, 2);
    hub.join(a);
    hub.join(b);
    drain(&mut arx);
    drain(&mut brx);

    assert_eq!(hub.attempt_pairing(), PairingOutcome::Paired(a, b));
    assert!(drain(&mut arx).contains(&HubMessage::matched(b)));
    assert!(drain(&mut brx).contains(&HubMessage::matched(a)));
    assert!(hub.pool().is_empty());
}

// ==================== Stale Reclamation ====================

#[test]
fn test_k_stale_entries_converge_within_k_cycles() {
    let mut hub = make_hub();
    let k = 4;

    let mut dead = Vec::new();
    for i in 0..k {
        let (id, rx) = connect(&mut hub, i);
        hub.join(id);
        dead.push(rx);
    }
    let (live_a, _ra) = connect(&mut hub, 20);
    let (live_b, _rb) = connect(&mut hub, 21);
    hub.join(live_a);
    hub.join(live_b);
    drop(dead);

    let mut cycles = 0;
    loop {
        cycles += 1;
        assert!(cycles <= k + 1, "exceeded k backoff cycles");
        match hub.attempt_pairing() {
            PairingOutcome::Paired(a, b) => {
                assert_eq!((a, b), (live_a, live_b));
                break;
            }
            PairingOutcome::Stale(reclaimed) => assert!(!reclaimed.is_empty()),
            PairingOutcome::Insufficient => panic!("live peers were lost"),
        }
    }
    assert!(hub.pool().is_empty());
}

// ==================== Ban Idempotence ====================

#[test]
fn test_banned_address_rejected_every_time() {
    let mut hub = make_hub();
    let (admin, _arx) = connect(&mut hub, 1);
    let (victim, _vrx) = connect(&mut hub, 9);
    hub.admin_login(admin, SECRET);
    hub.admin_ban(admin, victim).expect("ban in setup");

    for _ in 0..5 {
        let (tx, _rx) = peer_channel(8);
        assert!(hub.admit(addr(9), tx).is_err());
    }
    // Only the admin is registered; no id was ever allocated.
    assert_eq!(hub.registry().len(), 1);
}

#[test]
fn test_banned_address_never_reaches_admin_snapshot() {
    let mut hub = make_hub();
    let (admin, mut arx) = connect(&mut hub, 1);
    let (victim, _vrx) = connect(&mut hub, 9);
    hub.admin_login(admin, SECRET);
    hub.admin_ban(admin, victim).expect("ban in setup");
    drain(&mut arx);

    let (tx, _rx) = peer_channel(8);
    assert!(hub.admit(addr(9), tx).is_err());

    // The rejected attempt triggered no snapshot, and no snapshot ever
    // contains the banned address again.
    for msg in drain(&mut arx) {
        if let HubMessage::AdminUpdate { peers } = msg {
            assert!(peers.iter().all(|p| p.addr != addr(9)));
        }
    }
}

// ==================== Report Scenarios ====================

#[test]
fn test_first_report_requeues_and_repairs() {
    let mut hub = make_hub();
    let (a, mut arx) = connect(&mut hub, 1);
    let (b, mut brx) = connect(&mut hub, 2);
    hub.join(a);
    hub.join(b);
    assert_eq!(hub.attempt_pairing(), PairingOutcome::Paired(a, b));
    drain(&mut arx);
    drain(&mut brx);

    assert_eq!(hub.report(a, b), ReportResult::BothRequeued);
    assert!(hub.pool().contains(a));
    assert!(hub.pool().contains(b));
    assert!(drain(&mut arx).contains(&HubMessage::Requeue));
    assert!(drain(&mut brx).contains(&HubMessage::Requeue));

    // The pool settles back into a pair.
    assert!(matches!(hub.attempt_pairing(), PairingOutcome::Paired(_, _)));
}

#[test]
fn test_tenth_report_bans_exactly_once() {
    let mut hub = make_hub();
    let (a, mut arx) = connect(&mut hub, 1);

    for round in 1..THRESHOLD {
        let (b, _brx) = connect(&mut hub, 2);
        assert_eq!(hub.report(a, b), ReportResult::BothRequeued, "round {round}");
        hub.disconnect(b);
        hub.leave(a);
    }

    let (b, mut brx) = connect(&mut hub, 2);
    drain(&mut arx);
    assert_eq!(hub.report(a, b), ReportResult::ReportedBanned);

    assert!(hub.ledger().is_banned(addr(2)));
    assert!(!hub.registry().contains(b));
    assert!(drain(&mut brx)
        .iter()
        .any(|m| matches!(m, HubMessage::Banned { .. })));
    // The reporter is not auto-requeued in the ban branch.
    assert!(!hub.pool().contains(a));
    assert!(!drain(&mut arx).contains(&HubMessage::Requeue));
}

// ==================== Relay Isolation ====================

#[test]
fn test_relay_delivers_to_exactly_one_peer() {
    let mut hub = make_hub();
    let mut peers = Vec::new();
    for i in 0..5 {
        peers.push(connect(&mut hub, i));
    }
    for (_, rx) in &mut peers {
        drain(rx);
    }

    let sender = peers[0].0;
    let target = peers[3].0;
    assert!(hub.relay(
        target,
        HubMessage::Chat {
            from: sender,
            message: "only for you".to_string(),
        }
    ));

    for (i, (id, rx)) in peers.iter_mut().enumerate() {
        let got = drain(rx);
        if *id == target {
            assert_eq!(got.len(), 1, "target missed the message");
        } else {
            assert!(got.is_empty(), "peer {i} leaked a relayed message");
        }
    }
}

#[test]
fn test_relay_to_missing_peer_does_not_crash() {
    let hub = make_hub();
    assert!(!hub.relay(
        PeerId::new(),
        HubMessage::Chat {
            from: PeerId::new(),
            message: "nobody home".to_string(),
        }
    ));
}

// ==================== Property Tests ====================

proptest! {
    /// Repeated pairing over any number of joiners consumes the pool two
    /// at a time, in strict insertion order, leaving at most one waiter.
    #[test]
    fn prop_pairing_consumes_pool_in_order(n in 2usize..16) {
        let mut hub = make_hub();
        let mut joined = Vec::new();
        for i in 0..n {
            let (id, rx) = connect(&mut hub, u8::try_from(i).unwrap_or(0));
            hub.join(id);
            joined.push((id, rx));
        }

        let pairs = pair_until_settled(&mut hub);
        prop_assert_eq!(pairs.len(), n / 2);
        for (i, (a, b)) in pairs.iter().enumerate() {
            prop_assert_eq!(*a, joined[2 * i].0);
            prop_assert_eq!(*b, joined[2 * i + 1].0);
        }
        prop_assert_eq!(hub.pool().len(), n % 2);
    }

    /// Report counts never decrease, whatever order reports arrive in.
    #[test]
    fn prop_report_counts_are_monotonic(reports in proptest::collection::vec(0u8..4, 1..40)) {
        let mut hub = Hub::new(SECRET, u32::MAX);
        let (reporter, _rrx) = connect(&mut hub, 200);
        let mut targets = Vec::new();
        for i in 0u8..4 {
            targets.push(connect(&mut hub, i));
        }

        let mut last_counts = [0u32; 4];
        for idx in reports {
            let target = targets[idx as usize].0;
            hub.report(reporter, target);
            hub.leave(reporter);
            hub.leave(target);
            let count = hub.ledger().report_count(addr(idx));
            prop_assert!(count > last_counts[idx as usize]);
            last_counts[idx as usize] = count;
        }
    }
}

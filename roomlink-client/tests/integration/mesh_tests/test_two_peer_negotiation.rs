use roomlink_client::Role;
use roomlink_core::{RoomId, SignalKind};
use roomlink_server::TopologyMode;

use super::{all_connected, connecting_peer, join_in_order};
use crate::integration::init_tracing;
use crate::utils::{Loopback, eventually};

#[tokio::test]
async fn test_smaller_id_offers_exactly_once() {
    init_tracing();

    let net = Loopback::new(TopologyMode::FullRoster);
    let a = connecting_peer(&net, "a");
    let b = connecting_peer(&net, "b");

    join_in_order(&[&a, &b], &RoomId::from("R1")).await;

    let at_a = a.wait_until(|s| all_connected(s, 1)).await;
    let at_b = b.wait_until(|s| all_connected(s, 1)).await;

    assert_eq!(at_a.sessions[0].remote, b.id);
    assert_eq!(at_a.sessions[0].role, Role::Initiator);
    assert_eq!(at_b.sessions[0].remote, a.id);
    assert_eq!(at_b.sessions[0].role, Role::Responder);

    assert_eq!(a.sent.count_kind(SignalKind::Offer), 1);
    assert_eq!(a.sent.count_kind(SignalKind::Answer), 0);
    assert_eq!(b.sent.count_kind(SignalKind::Offer), 0);
    assert_eq!(b.sent.count_kind(SignalKind::Answer), 1);
}

#[tokio::test]
async fn test_candidates_reach_the_other_side() {
    init_tracing();

    let net = Loopback::new(TopologyMode::FullRoster);
    let a = connecting_peer(&net, "a");
    let b = connecting_peer(&net, "b");

    join_in_order(&[&a, &b], &RoomId::from("R1")).await;

    let towards_a = b.factory.clone();
    let a_id = a.id.clone();
    eventually("a's candidates at b", || {
        towards_a
            .latest(&a_id)
            .is_some_and(|t| t.applied_candidates() == vec!["a-cand-1", "a-cand-2"])
    })
    .await;

    let towards_b = a.factory.clone();
    let b_id = b.id.clone();
    eventually("b's candidates at a", || {
        towards_b
            .latest(&b_id)
            .is_some_and(|t| t.applied_candidates() == vec!["b-cand-1", "b-cand-2"])
    })
    .await;

    assert_eq!(net.router().dropped_count(), 0);
}

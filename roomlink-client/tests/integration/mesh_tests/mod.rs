mod test_two_peer_negotiation;

use crate::utils::{Loopback, MeshPeer, MockBehavior, MockTransportFactory};
use roomlink_client::{MeshSnapshot, NegotiationState};
use roomlink_core::RoomId;

pub fn connecting_peer(net: &Loopback, name: &str) -> MeshPeer {
    net.spawn_peer(name, MockTransportFactory::new(name, MockBehavior::connecting()))
}

pub fn all_connected(snapshot: &MeshSnapshot, sessions: usize) -> bool {
    snapshot.sessions.len() == sessions
        && snapshot
            .sessions
            .iter()
            .all(|session| session.state == NegotiationState::Connected)
}

/// Joins peers one at a time, each after the previous one saw itself in the roster.
pub async fn join_in_order(peers: &[&MeshPeer], room: &RoomId) {
    for (i, peer) in peers.iter().enumerate() {
        peer.handle.join_room(room.clone()).unwrap();
        peer.wait_until(|s| s.participants.len() == i + 1).await;
    }
}

use roomlink_core::{RoomId, ServerMessage};
use roomlink_server::TopologyMode;

use crate::integration::{connect_all, create_test_router, init_tracing};

#[tokio::test]
async fn test_previous_members_get_peer_joined() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::DirectNotify);
    let ids = connect_all(&output, &["a", "b", "c"]).await;
    let room = RoomId::from("R2");

    for id in &ids {
        router.on_join(id, &room).await.unwrap();
    }

    let a_msgs = output.messages_for(&ids[0]).await;
    let joined: Vec<_> = a_msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::PeerJoined { participant_id, .. } => Some(participant_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(joined, vec![ids[1].clone(), ids[2].clone()]);

    // the joiner only gets a snapshot, never a notice about itself
    let c_msgs = output.messages_for(&ids[2]).await;
    assert_eq!(c_msgs.len(), 1);
    match &c_msgs[0] {
        ServerMessage::Roster(roster) => assert_eq!(roster.participants, ids),
        other => panic!("expected roster, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remaining_members_get_peer_left() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::DirectNotify);
    let ids = connect_all(&output, &["a", "b"]).await;
    let room = RoomId::from("R1");

    router.on_join(&ids[0], &room).await.unwrap();
    router.on_join(&ids[1], &room).await.unwrap();
    output.clear().await;

    router.on_leave(&ids[0], &room).await.unwrap();

    assert_eq!(
        output.messages_for(&ids[1]).await,
        vec![ServerMessage::PeerLeft {
            room: room.clone(),
            participant_id: ids[0].clone(),
        }]
    );
}

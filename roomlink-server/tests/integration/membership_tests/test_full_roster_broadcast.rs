use roomlink_core::{RoomId, ServerMessage};
use roomlink_server::TopologyMode;

use crate::integration::{connect_all, create_test_router, init_tracing};

#[tokio::test]
async fn test_three_participants_receive_roster_per_join() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a", "b", "c"]).await;
    let room = RoomId::from("R2");

    for id in &ids {
        router.on_join(id, &room).await.expect("join failed");
    }

    // a saw its own join plus one roster per later join
    let a_rosters = output.rosters_for(&ids[0]).await;
    assert_eq!(a_rosters.len(), 3);
    // b joined second: its own join plus c's
    assert_eq!(output.rosters_for(&ids[1]).await.len(), 2);
    assert_eq!(output.rosters_for(&ids[2]).await.len(), 1);

    let last = a_rosters.last().expect("no roster");
    assert_eq!(last.participants, ids);
    assert!(a_rosters.windows(2).all(|w| w[0].version < w[1].version));

    for id in &ids {
        let latest = output.rosters_for(id).await.pop().expect("no roster");
        assert_eq!(latest.participants, ids, "{} has a stale roster", id);
    }
}

#[tokio::test]
async fn test_repeated_join_resends_roster_without_duplicates() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a", "b"]).await;
    let room = RoomId::from("R1");

    router.on_join(&ids[0], &room).await.unwrap();
    router.on_join(&ids[1], &room).await.unwrap();
    output.clear().await;

    let roster = router.on_join(&ids[1], &room).await.unwrap();

    assert_eq!(roster.participants, ids);
    assert_eq!(router.registry().members_of(&room).len(), 2);
    assert!(output.messages_for(&ids[0]).await.is_empty());
    assert!(matches!(
        output.messages_for(&ids[1]).await.as_slice(),
        [ServerMessage::Roster(_)]
    ));
}

#[tokio::test]
async fn test_leave_broadcasts_updated_roster() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a", "b", "c"]).await;
    let room = RoomId::from("R1");

    for id in &ids {
        router.on_join(id, &room).await.unwrap();
    }
    output.clear().await;

    router.on_leave(&ids[1], &room).await.unwrap();

    for remaining in [&ids[0], &ids[2]] {
        let rosters = output.rosters_for(remaining).await;
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].participants, vec![ids[0].clone(), ids[2].clone()]);
    }
    assert!(output.messages_for(&ids[1]).await.is_empty());
    assert_eq!(router.current_room(&ids[1]), None);
}

#[tokio::test]
async fn test_joiner_hears_before_existing_members() {
    init_tracing();

    for topology in [TopologyMode::FullRoster, TopologyMode::DirectNotify] {
        let (router, output) = create_test_router(topology);
        let ids = connect_all(&output, &["a", "b", "c"]).await;
        let room = RoomId::from("R1");

        router.on_join(&ids[0], &room).await.unwrap();
        router.on_join(&ids[1], &room).await.unwrap();
        output.clear().await;

        router.on_join(&ids[2], &room).await.unwrap();

        let recipients = output.recipients().await;
        assert_eq!(recipients.len(), 3, "{}", topology);
        assert_eq!(recipients[0], ids[2], "{}: joiner was not served first", topology);
        assert!(matches!(
            output.messages_for(&ids[2]).await.as_slice(),
            [ServerMessage::Roster(_)]
        ));
    }
}

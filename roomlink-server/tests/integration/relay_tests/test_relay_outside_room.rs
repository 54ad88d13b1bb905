use roomlink_core::{ParticipantId, RoomId, SignalPayload, SignalingError};
use roomlink_server::TopologyMode;

use crate::integration::{connect_all, create_test_router, init_tracing};

#[tokio::test]
async fn test_signal_across_rooms_is_dropped() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a", "b"]).await;
    router.on_join(&ids[0], &RoomId::from("R1")).await.unwrap();
    router.on_join(&ids[1], &RoomId::from("R2")).await.unwrap();

    router
        .relay(&ids[0], &ids[1], SignalPayload::Offer { sdp: "x".into() })
        .await
        .unwrap();

    assert!(output.signals_for(&ids[1]).await.is_empty());
    assert_eq!(router.dropped_count(), 1);
}

#[tokio::test]
async fn test_signal_from_roomless_sender_is_dropped() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a", "b"]).await;
    router.on_join(&ids[1], &RoomId::from("R1")).await.unwrap();

    router
        .relay(&ids[0], &ids[1], SignalPayload::Offer { sdp: "x".into() })
        .await
        .unwrap();

    assert!(output.signals_for(&ids[1]).await.is_empty());
    assert_eq!(router.dropped_count(), 1);
}

#[tokio::test]
async fn test_empty_target_is_rejected_not_dropped() {
    init_tracing();

    let (router, output) = create_test_router(TopologyMode::FullRoster);
    let ids = connect_all(&output, &["a"]).await;
    router.on_join(&ids[0], &RoomId::from("R1")).await.unwrap();

    let err = router
        .relay(
            &ids[0],
            &ParticipantId::from(""),
            SignalPayload::Offer { sdp: "x".into() },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SignalingError::InvalidArgument(_)));
    assert_eq!(router.dropped_count(), 0);
}

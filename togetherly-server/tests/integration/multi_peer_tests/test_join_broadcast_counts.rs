use togetherly_core::{ClientMessage, ConnectionId, RoomId, ServerMessage};

use crate::integration::{create_test_router, init_tracing};

#[tokio::test]
async fn test_join_notifies_every_existing_member() {
    init_tracing();

    let (router, registry, signaling) = create_test_router();
    let room = RoomId::from("room1");

    let existing: Vec<ConnectionId> = (0..5).map(|i| ConnectionId::from(format!("p{i}"))).collect();
    for id in &existing {
        router.dispatch(id, ClientMessage::JoinRoom(room.clone())).await;
    }
    signaling.clear().await;

    let newcomer = ConnectionId::from("x");
    router
        .dispatch(&newcomer, ClientMessage::JoinRoom(room.clone()))
        .await;

    let deliveries = signaling.all().await;
    assert_eq!(deliveries.len(), existing.len());
    for id in &existing {
        assert_eq!(
            signaling.messages_for(id).await,
            vec![ServerMessage::UserJoined(newcomer.clone())]
        );
    }
    assert!(signaling.messages_for(&newcomer).await.is_empty());
    assert_eq!(registry.members(&room).len(), existing.len() + 1);
}

#[tokio::test]
async fn test_repeated_join_is_silent() {
    let (router, registry, signaling) = create_test_router();
    let room = RoomId::from("room1");
    let a = ConnectionId::from("a");
    let b = ConnectionId::from("b");

    router.dispatch(&a, ClientMessage::JoinRoom(room.clone())).await;
    router.dispatch(&b, ClientMessage::JoinRoom(room.clone())).await;
    router.dispatch(&b, ClientMessage::JoinRoom(room.clone())).await;

    assert_eq!(
        signaling.messages_for(&a).await,
        vec![ServerMessage::UserJoined(b.clone())]
    );
    assert_eq!(registry.members(&room).len(), 2);
    assert_eq!(registry.rooms_of(&b), vec![room]);
}

#[tokio::test]
async fn test_first_member_gets_no_broadcast() {
    let (router, registry, signaling) = create_test_router();
    let room = RoomId::from("fresh");
    let a = ConnectionId::from("a");

    router.dispatch(&a, ClientMessage::JoinRoom(room.clone())).await;

    assert!(signaling.all().await.is_empty());
    assert_eq!(registry.members(&room), vec![a]);
}

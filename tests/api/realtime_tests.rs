//! Realtime Flow Tests
//!
//! End-to-end presence and messaging flows through the hub and chat router
//! over in-memory stores.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use interest_connect::presentation::realtime::{Hub, ServerEvent};
use interest_connect::presentation::realtime::events::{SendMessagePayload, TypingRequest};
use interest_connect::domain::MessageType;
use interest_connect::shared::AppError;

use crate::common::{self, InMemoryCommunityStore};

fn direct_send(receiver_id: i64, content: &str) -> SendMessagePayload {
    SendMessagePayload {
        receiver_id: Some(receiver_id),
        community_id: None,
        content: content.to_string(),
        message_type: MessageType::Text,
    }
}

#[tokio::test]
async fn test_presence_lifecycle_across_two_connections() {
    let hub = Arc::new(Hub::new());

    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    assert_eq!(common::drain_names(&mut alice_rx), vec!["online_users"]);

    let (_bob_conn, mut bob_rx) = common::connect(&hub, 2, "bob");

    // Alice sees exactly one user_online for bob; bob gets the roster with
    // both identities and no echo of his own arrival.
    assert_eq!(common::drain_names(&mut alice_rx), vec!["user_online"]);
    let bob_events = common::drain(&mut bob_rx);
    assert_eq!(bob_events.len(), 1);
    match &bob_events[0] {
        ServerEvent::OnlineUsers(roster) => {
            let mut ids: Vec<i64> = roster.iter().map(|u| u.id).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2]);
        }
        other => panic!("expected online_users, got {}", other.name()),
    }

    hub.deregister(alice_conn);
    assert_eq!(common::drain_names(&mut bob_rx), vec!["user_offline"]);
    assert!(!hub.is_online(1));
}

#[tokio::test]
async fn test_reconnect_evicts_stale_session_without_offline() {
    let hub = Arc::new(Hub::new());

    let (old_conn, _old_rx) = common::connect(&hub, 1, "alice");
    let (observer_conn, mut observer_rx) = common::connect(&hub, 2, "bob");
    common::drain(&mut observer_rx);

    let (_new_conn, _new_rx) = common::connect(&hub, 1, "alice");
    assert_eq!(common::drain_names(&mut observer_rx), vec!["user_online"]);

    // The evicted connection's late disconnect must not announce offline:
    // the user is still reachable through the new connection.
    hub.deregister(old_conn);
    assert_eq!(common::drain_names(&mut observer_rx), Vec::<&str>::new());
    assert!(hub.is_online(1));
    let _ = observer_conn;
}

#[tokio::test]
async fn test_direct_message_delivery_and_notification_record() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    let (_bob_conn, mut bob_rx) = common::connect(&hub, 2, "bob");
    common::drain(&mut alice_rx);
    common::drain(&mut bob_rx);

    let (router, message_store, notification_store) =
        common::router(hub.clone(), InMemoryCommunityStore::default());

    router
        .send_message(alice_conn, &common::identity(1, "alice"), direct_send(2, "hi bob"))
        .await
        .expect("send should succeed");

    assert_eq!(common::drain_names(&mut alice_rx), vec!["message_sent"]);
    assert_eq!(
        common::drain_names(&mut bob_rx),
        vec!["new_message", "new_notification"]
    );

    let messages = message_store.messages.lock();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].receiver_id, Some(2));

    let notifications = notification_store.notifications.lock();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].recipient_id, 2);
}

#[tokio::test]
async fn test_offline_receiver_still_gets_notification_record() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    common::drain(&mut alice_rx);

    let (router, message_store, notification_store) =
        common::router(hub.clone(), InMemoryCommunityStore::default());

    router
        .send_message(alice_conn, &common::identity(1, "alice"), direct_send(7, "you there?"))
        .await
        .expect("send should succeed");

    // Live delivery is dropped but the message and notification rows exist.
    assert_eq!(common::drain_names(&mut alice_rx), vec!["message_sent"]);
    assert_eq!(message_store.messages.lock().len(), 1);
    assert_eq!(notification_store.notifications.lock().len(), 1);
}

#[tokio::test]
async fn test_community_flow_requires_membership_then_fans_out() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    let (bob_conn, mut bob_rx) = common::connect(&hub, 2, "bob");
    common::drain(&mut alice_rx);
    common::drain(&mut bob_rx);

    let store = InMemoryCommunityStore::with_member(10, 1);
    store.memberships.lock().insert((10, 2));
    let (router, _, _) = common::router(hub.clone(), store);

    router.join_community(alice_conn, 1, 10).await.expect("alice is a member");
    router.join_community(bob_conn, 2, 10).await.expect("bob is a member");

    let outsider = router.join_community(bob_conn, 3, 10).await;
    assert!(matches!(outsider, Err(AppError::Forbidden(_))));

    router
        .send_message(
            alice_conn,
            &common::identity(1, "alice"),
            SendMessagePayload {
                receiver_id: None,
                community_id: Some(10),
                content: "hello community".to_string(),
                message_type: MessageType::Text,
            },
        )
        .await
        .expect("community send should succeed");

    // Fan-out includes the sender's own connection.
    assert_eq!(common::drain_names(&mut alice_rx), vec!["community_message"]);
    assert_eq!(common::drain_names(&mut bob_rx), vec!["community_message"]);
}

#[tokio::test]
async fn test_community_typing_excludes_sender() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    let (bob_conn, mut bob_rx) = common::connect(&hub, 2, "bob");
    common::drain(&mut alice_rx);
    common::drain(&mut bob_rx);

    hub.join_community(alice_conn, 10);
    hub.join_community(bob_conn, 10);

    let (router, _, _) = common::router(hub.clone(), InMemoryCommunityStore::default());
    router.relay_typing(
        alice_conn,
        &common::identity(1, "alice"),
        TypingRequest {
            receiver_id: None,
            community_id: Some(10),
            is_typing: true,
        },
    );

    assert_eq!(common::drain_names(&mut alice_rx), Vec::<&str>::new());
    assert_eq!(common::drain_names(&mut bob_rx), vec!["user_typing"]);
}

#[tokio::test]
async fn test_mark_read_notifies_original_sender() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    let (_bob_conn, mut bob_rx) = common::connect(&hub, 2, "bob");
    common::drain(&mut alice_rx);
    common::drain(&mut bob_rx);

    let (router, message_store, _) =
        common::router(hub.clone(), InMemoryCommunityStore::default());

    router
        .send_message(alice_conn, &common::identity(1, "alice"), direct_send(2, "read me"))
        .await
        .expect("send should succeed");
    common::drain(&mut alice_rx);
    common::drain(&mut bob_rx);

    router.mark_read(2, 1).await.expect("mark_read should succeed");

    assert_eq!(common::drain_names(&mut alice_rx), vec!["message_read"]);
    assert!(message_store.messages.lock()[0].is_read);
}

#[tokio::test]
async fn test_send_message_rejects_ambiguous_target() {
    let hub = Arc::new(Hub::new());
    let (alice_conn, mut alice_rx) = common::connect(&hub, 1, "alice");
    common::drain(&mut alice_rx);

    let (router, message_store, _) =
        common::router(hub.clone(), InMemoryCommunityStore::default());

    let result = router
        .send_message(
            alice_conn,
            &common::identity(1, "alice"),
            SendMessagePayload {
                receiver_id: Some(2),
                community_id: Some(10),
                content: "both targets".to_string(),
                message_type: MessageType::Text,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(message_store.messages.lock().is_empty());
}

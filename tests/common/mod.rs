//! Common Test Utilities
//!
//! In-memory store implementations and hub connection helpers for
//! exercising the realtime flow without a database.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use interest_connect::domain::{
    Community, CommunityRepository, Message, MessageRepository, NewMessage, NewNotification,
    NotificationRepository, UserIdentity,
};
use interest_connect::presentation::realtime::{ChatRouter, ConnectionId, Hub, ServerEvent};
use interest_connect::shared::AppError;

pub const STORE_TIMEOUT: Duration = Duration::from_secs(1);

pub fn identity(id: i64, name: &str) -> UserIdentity {
    UserIdentity {
        id,
        name: name.to_string(),
        profile_picture: None,
    }
}

/// Register a fresh connection for the user on the hub and return its id and
/// event stream.
pub fn connect(
    hub: &Hub,
    id: i64,
    name: &str,
) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = uuid::Uuid::new_v4();
    hub.register(identity(id, name), connection_id, tx);
    (connection_id, rx)
}

/// Collect everything currently buffered on a connection's event stream.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wire names of everything buffered on a connection's event stream.
pub fn drain_names(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<&'static str> {
    drain(rx).iter().map(|e| e.name()).collect()
}

/// In-memory message store assigning sequential ids.
#[derive(Default)]
pub struct InMemoryMessageStore {
    pub messages: Mutex<Vec<Message>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn create(&self, message: &NewMessage) -> Result<Message, AppError> {
        let mut messages = self.messages.lock();
        let stored = Message {
            id: messages.len() as i64 + 1,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            community_id: message.community_id,
            content: message.content.clone(),
            message_type: message.message_type,
            is_read: false,
            created_at: Utc::now(),
        };
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn mark_read(&self, message_id: i64, reader_id: i64) -> Result<u64, AppError> {
        let mut messages = self.messages.lock();
        let mut updated = 0;
        for message in messages.iter_mut() {
            if message.id == message_id && message.receiver_id == Some(reader_id) {
                message.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn sender_of(&self, message_id: i64) -> Result<Option<i64>, AppError> {
        Ok(self
            .messages
            .lock()
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.sender_id))
    }
}

/// In-memory notification store recording every insert.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    pub notifications: Mutex<Vec<NewNotification>>,
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn create(&self, notification: &NewNotification) -> Result<(), AppError> {
        self.notifications.lock().push(notification.clone());
        Ok(())
    }
}

/// In-memory community store backed by a membership set.
#[derive(Default)]
pub struct InMemoryCommunityStore {
    pub memberships: Mutex<HashSet<(i64, i64)>>,
}

impl InMemoryCommunityStore {
    pub fn with_member(community_id: i64, user_id: i64) -> Self {
        let store = Self::default();
        store.memberships.lock().insert((community_id, user_id));
        store
    }
}

#[async_trait]
impl CommunityRepository for InMemoryCommunityStore {
    async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self.memberships.lock().contains(&(community_id, user_id)))
    }

    async fn joined_community_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .memberships
            .lock()
            .iter()
            .filter(|(_, uid)| *uid == user_id)
            .map(|(cid, _)| *cid)
            .collect())
    }

    async fn recommendation_pool(&self, _excluded_ids: &[i64]) -> Result<Vec<Community>, AppError> {
        Ok(Vec::new())
    }
}

/// Build a router over fresh in-memory stores.
pub fn router(
    hub: Arc<Hub>,
    community_store: InMemoryCommunityStore,
) -> (
    ChatRouter<InMemoryMessageStore, InMemoryNotificationStore, InMemoryCommunityStore>,
    Arc<InMemoryMessageStore>,
    Arc<InMemoryNotificationStore>,
) {
    let message_store = Arc::new(InMemoryMessageStore::default());
    let notification_store = Arc::new(InMemoryNotificationStore::default());
    let router = ChatRouter::new(
        hub,
        message_store.clone(),
        notification_store.clone(),
        Arc::new(community_store),
        STORE_TIMEOUT,
    );
    (router, message_store, notification_store)
}

//! Chat Event Routing
//!
//! Orchestrates the persist-then-deliver sequence for each inbound realtime
//! event: message store write first, live fan-out second, notification
//! record regardless of recipient reachability. No retry and no delivery
//! queue; a failed store write is reported to the originating connection
//! only.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::events::{
    CommunityMessagePayload, DirectMessagePayload, MessagePayload, MessageReadPayload,
    NotificationPushPayload, SendMessagePayload, ServerEvent, TypingPayload, TypingRequest,
};
use super::hub::{ConnectionId, Hub};
use crate::domain::{
    CommunityRepository, MessageRepository, NewMessage, NewNotification, NotificationRepository,
    UserIdentity,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Maximum message content length accepted over the realtime channel.
const MAX_CONTENT_LENGTH: usize = 5000;

/// Bound a store call reachable from a realtime handler. A hung store must
/// not stall the connection's event loop forever; on expiry the call is
/// treated like any other store failure.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StoreUnavailable("store call timed out".into())),
    }
}

/// Routes message, typing, and read-receipt events between the hub and the
/// external stores.
pub struct ChatRouter<M, N, C>
where
    M: MessageRepository,
    N: NotificationRepository,
    C: CommunityRepository,
{
    hub: Arc<Hub>,
    message_repo: Arc<M>,
    notification_repo: Arc<N>,
    community_repo: Arc<C>,
    store_timeout: Duration,
}

impl<M, N, C> ChatRouter<M, N, C>
where
    M: MessageRepository,
    N: NotificationRepository,
    C: CommunityRepository,
{
    pub fn new(
        hub: Arc<Hub>,
        message_repo: Arc<M>,
        notification_repo: Arc<N>,
        community_repo: Arc<C>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            hub,
            message_repo,
            notification_repo,
            community_repo,
            store_timeout,
        }
    }

    /// Route a send request to the direct or community path.
    ///
    /// Exactly one target must be set. On any store failure the caller
    /// reports to the sender only; nothing was delivered before the
    /// persistence succeeded.
    pub async fn send_message(
        &self,
        connection_id: ConnectionId,
        sender: &UserIdentity,
        request: SendMessagePayload,
    ) -> Result<(), AppError> {
        if request.content.is_empty() || request.content.len() > MAX_CONTENT_LENGTH {
            return Err(AppError::Validation("Invalid message content".into()));
        }

        match (request.receiver_id, request.community_id) {
            (Some(receiver_id), None) => {
                self.send_direct(connection_id, sender, receiver_id, request)
                    .await
            }
            (None, Some(community_id)) => {
                self.send_community(sender, community_id, request).await
            }
            _ => Err(AppError::Validation(
                "Message requires exactly one of receiverId or communityId".into(),
            )),
        }
    }

    /// Direct path: persist, echo `message_sent` to the sender, deliver
    /// `new_message` to the receiver if connected (dropped otherwise, no
    /// backlog replay on reconnect), then write the notification record
    /// regardless of reachability and push a live preview if connected.
    async fn send_direct(
        &self,
        connection_id: ConnectionId,
        sender: &UserIdentity,
        receiver_id: i64,
        request: SendMessagePayload,
    ) -> Result<(), AppError> {
        let new_message =
            NewMessage::direct(sender.id, receiver_id, request.content, request.message_type);
        let message = bounded(self.store_timeout, self.message_repo.create(&new_message)).await?;

        let payload = MessagePayload::from_message(&message, sender.clone());

        self.hub.send_to_connection(
            connection_id,
            ServerEvent::MessageSent(payload.clone()),
        );

        let delivered = self.hub.send_to_user(
            receiver_id,
            ServerEvent::NewMessage(DirectMessagePayload {
                message: payload.clone(),
                is_from_me: false,
            }),
        );
        if !delivered {
            tracing::debug!(
                receiver_id,
                message_id = message.id,
                "Receiver offline, live delivery dropped"
            );
        }

        // Store-and-forward for the notification record, but not for the
        // live event: the record is written even when the receiver is
        // offline.
        let notification =
            NewNotification::direct_message(receiver_id, sender.id, &sender.name, message.id);
        bounded(self.store_timeout, self.notification_repo.create(&notification)).await?;

        let preview: String = payload.content.chars().take(50).collect();
        self.hub.send_to_user(
            receiver_id,
            ServerEvent::NewNotification(NotificationPushPayload {
                notification_type: notification.notification_type.as_str().to_string(),
                sender: sender.clone(),
                preview,
            }),
        );

        metrics::record_routed_event("new_message");
        Ok(())
    }

    /// Community path: persist, then fan out to the broadcast group, sender
    /// included.
    async fn send_community(
        &self,
        sender: &UserIdentity,
        community_id: i64,
        request: SendMessagePayload,
    ) -> Result<(), AppError> {
        let new_message =
            NewMessage::community(sender.id, community_id, request.content, request.message_type);
        let message = bounded(self.store_timeout, self.message_repo.create(&new_message)).await?;

        self.hub.broadcast_community(
            community_id,
            ServerEvent::CommunityMessage(CommunityMessagePayload {
                community_id,
                message: MessagePayload::from_message(&message, sender.clone()),
            }),
            None,
        );

        metrics::record_routed_event("community_message");
        Ok(())
    }

    /// Admit a connection to a community broadcast group.
    ///
    /// Membership is verified against the store before joining; the REST
    /// layer guards reads and posts, and the broadcast group mirrors that
    /// boundary instead of trusting any authenticated socket.
    pub async fn join_community(
        &self,
        connection_id: ConnectionId,
        user_id: i64,
        community_id: i64,
    ) -> Result<(), AppError> {
        let member = bounded(
            self.store_timeout,
            self.community_repo.is_member(community_id, user_id),
        )
        .await?;

        if !member {
            return Err(AppError::Forbidden("Not a member of this community".into()));
        }

        self.hub.join_community(connection_id, community_id);
        tracing::debug!(user_id, community_id, "Joined community channel");
        Ok(())
    }

    /// Remove a connection from a community broadcast group.
    pub fn leave_community(&self, connection_id: ConnectionId, community_id: i64) {
        self.hub.leave_community(connection_id, community_id);
    }

    /// Forward a typing signal. Nothing is persisted and an unreachable
    /// target is a silent no-op.
    pub fn relay_typing(
        &self,
        connection_id: ConnectionId,
        sender: &UserIdentity,
        request: TypingRequest,
    ) {
        if let Some(receiver_id) = request.receiver_id {
            self.hub.send_to_user(
                receiver_id,
                ServerEvent::UserTyping(TypingPayload {
                    community_id: None,
                    user_id: sender.id,
                    user: sender.clone(),
                    is_typing: request.is_typing,
                }),
            );
        }

        if let Some(community_id) = request.community_id {
            self.hub.broadcast_community(
                community_id,
                ServerEvent::UserTyping(TypingPayload {
                    community_id: Some(community_id),
                    user_id: sender.id,
                    user: sender.clone(),
                    is_typing: request.is_typing,
                }),
                Some(connection_id),
            );
        }
    }

    /// Mark a message read and notify the original sender if connected.
    ///
    /// The reader-is-recipient condition is enforced by the store update's
    /// filter, not re-checked here.
    pub async fn mark_read(&self, reader_id: i64, message_id: i64) -> Result<(), AppError> {
        let updated = bounded(
            self.store_timeout,
            self.message_repo.mark_read(message_id, reader_id),
        )
        .await?;
        if updated == 0 {
            tracing::trace!(message_id, reader_id, "mark_read matched no rows");
        }

        let sender_id = bounded(self.store_timeout, self.message_repo.sender_of(message_id)).await?;
        if let Some(sender_id) = sender_id {
            self.hub.send_to_user(
                sender_id,
                ServerEvent::MessageRead(MessageReadPayload { message_id }),
            );
        }

        Ok(())
    }
}

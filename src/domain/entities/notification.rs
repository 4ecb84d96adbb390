//! Notification entity and repository trait.
//!
//! Notifications are store-and-forward: a record is written for the recipient
//! even when they are offline, unlike live realtime events which are dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Notification category, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewMessage,
    FriendRequest,
    CommunityInvite,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::FriendRequest => "friend_request",
            Self::CommunityInvite => "community_invite",
        }
    }
}

/// Insert payload for a new notification record.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub sender_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub link: String,
    pub related_id: Option<i64>,
}

impl NewNotification {
    /// Notification for a direct message from `sender` to `recipient_id`.
    pub fn direct_message(recipient_id: i64, sender_id: i64, sender_name: &str, message_id: i64) -> Self {
        Self {
            recipient_id,
            sender_id,
            notification_type: NotificationType::NewMessage,
            title: "New Message".to_string(),
            body: format!("{} sent you a message", sender_name),
            link: format!("/chat/{}", sender_id),
            related_id: Some(message_id),
        }
    }
}

/// Repository trait for notification persistence (the Notification Store).
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a notification record.
    async fn create(&self, notification: &NewNotification) -> Result<(), AppError>;
}

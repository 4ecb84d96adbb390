//! Message entity and repository trait.
//!
//! Maps to the `messages` table. Exactly one of `receiver_id` and
//! `community_id` is set per row: direct messages carry a receiver, community
//! messages carry a community.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Message content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
}

impl MessageType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "image" => Self::Image,
            "file" => Self::File,
            _ => Self::Text,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: Option<i64>,
    pub community_id: Option<i64>,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this is a direct (user-to-user) message.
    pub fn is_direct(&self) -> bool {
        self.receiver_id.is_some()
    }
}

/// Insert payload for a new message. The id and timestamp come from the
/// database.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: Option<i64>,
    pub community_id: Option<i64>,
    pub content: String,
    pub message_type: MessageType,
}

impl NewMessage {
    /// Direct message to a single receiver.
    pub fn direct(sender_id: i64, receiver_id: i64, content: String, message_type: MessageType) -> Self {
        Self {
            sender_id,
            receiver_id: Some(receiver_id),
            community_id: None,
            content,
            message_type,
        }
    }

    /// Message to a community channel.
    pub fn community(sender_id: i64, community_id: i64, content: String, message_type: MessageType) -> Self {
        Self {
            sender_id,
            receiver_id: None,
            community_id: Some(community_id),
            content,
            message_type,
        }
    }
}

/// Repository trait for message persistence (the Message Store).
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message and return the stored row.
    async fn create(&self, message: &NewMessage) -> Result<Message, AppError>;

    /// Mark a message read, conditioned on `reader_id` being the recipient.
    /// Returns the number of rows updated (0 if the filter did not match).
    async fn mark_read(&self, message_id: i64, reader_id: i64) -> Result<u64, AppError>;

    /// Look up the original sender of a message.
    async fn sender_of(&self, message_id: i64) -> Result<Option<i64>, AppError>;
}

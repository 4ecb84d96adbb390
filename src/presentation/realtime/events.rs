//! Realtime Event Types
//!
//! Tagged wire schemas for every event the hub sends or receives. The event
//! names and payload field casing are a contract with the web client; they
//! follow the `{"event": ..., "data": ...}` envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Message, MessageType, UserIdentity};

/// Server-to-client events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Roster snapshot sent to a newly registered connection only.
    OnlineUsers(Vec<UserIdentity>),
    /// A user came online; sent to every other connection.
    UserOnline(PresencePayload),
    /// A user went offline; sent to all remaining connections.
    UserOffline(UserOfflinePayload),
    /// Direct message delivered to the receiver's live connection.
    NewMessage(DirectMessagePayload),
    /// Persistence confirmation echoed to the sender.
    MessageSent(MessagePayload),
    /// Message fanned out to a community broadcast group, sender included.
    CommunityMessage(CommunityMessagePayload),
    /// Scoped failure report to the originating connection only.
    MessageError(MessageErrorPayload),
    /// Typing indicator relay; ephemeral, most recent signal wins.
    UserTyping(TypingPayload),
    /// Read receipt delivered to the original sender.
    MessageRead(MessageReadPayload),
    /// Live notification preview pushed to a connected recipient.
    NewNotification(NotificationPushPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: i64,
    pub user: UserIdentity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOfflinePayload {
    pub user_id: i64,
}

/// Common message body shared by `message_sent`, `new_message`, and
/// `community_message`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: i64,
    pub content: String,
    pub message_type: MessageType,
    pub sender: UserIdentity,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl MessagePayload {
    /// Build the wire payload from a stored message and the sender's
    /// connect-time identity snapshot.
    pub fn from_message(message: &Message, sender: UserIdentity) -> Self {
        Self {
            id: message.id,
            content: message.content.clone(),
            message_type: message.message_type,
            sender,
            created_at: message.created_at,
            is_read: message.is_read,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessagePayload {
    #[serde(flatten)]
    pub message: MessagePayload,
    pub is_from_me: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMessagePayload {
    pub community_id: i64,
    #[serde(flatten)]
    pub message: MessagePayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageErrorPayload {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i64>,
    pub user_id: i64,
    pub user: UserIdentity,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadPayload {
    pub message_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPushPayload {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub sender: UserIdentity,
    pub preview: String,
}

impl ServerEvent {
    /// Event name as it appears on the wire, for logging and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::OnlineUsers(_) => "online_users",
            ServerEvent::UserOnline(_) => "user_online",
            ServerEvent::UserOffline(_) => "user_offline",
            ServerEvent::NewMessage(_) => "new_message",
            ServerEvent::MessageSent(_) => "message_sent",
            ServerEvent::CommunityMessage(_) => "community_message",
            ServerEvent::MessageError(_) => "message_error",
            ServerEvent::UserTyping(_) => "user_typing",
            ServerEvent::MessageRead(_) => "message_read",
            ServerEvent::NewNotification(_) => "new_notification",
        }
    }

    /// Scoped error event for the originating connection.
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::MessageError(MessageErrorPayload {
            error: message.into(),
        })
    }
}

/// Client-to-server events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Must be the first frame on the connection.
    Authenticate(AuthenticatePayload),
    JoinCommunity(CommunityRef),
    LeaveCommunity(CommunityRef),
    SendMessage(SendMessagePayload),
    Typing(TypingRequest),
    MarkRead(MarkReadPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatePayload {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRef {
    pub community_id: i64,
}

/// Send request; exactly one of `receiver_id` / `community_id` must be set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub receiver_id: Option<i64>,
    pub community_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub receiver_id: Option<i64>,
    pub community_id: Option<i64>,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadPayload {
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity() -> UserIdentity {
        UserIdentity {
            id: 1,
            name: "Ada".to_string(),
            profile_picture: None,
        }
    }

    #[test]
    fn test_user_online_wire_shape() {
        let event = ServerEvent::UserOnline(PresencePayload {
            user_id: 1,
            user: identity(),
        });

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "user_online");
        assert_eq!(json["data"]["userId"], 1);
        assert_eq!(json["data"]["user"]["name"], "Ada");
    }

    #[test]
    fn test_new_message_flattens_body_and_marks_not_from_me() {
        let event = ServerEvent::NewMessage(DirectMessagePayload {
            message: MessagePayload {
                id: 10,
                content: "hello".to_string(),
                message_type: MessageType::Text,
                sender: identity(),
                created_at: Utc::now(),
                is_read: false,
            },
            is_from_me: false,
        });

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "new_message");
        assert_eq!(json["data"]["id"], 10);
        assert_eq!(json["data"]["messageType"], "text");
        assert_eq!(json["data"]["isFromMe"], false);
        assert_eq!(json["data"]["isRead"], false);
    }

    #[test]
    fn test_community_message_carries_community_id() {
        let event = ServerEvent::CommunityMessage(CommunityMessagePayload {
            community_id: 42,
            message: MessagePayload {
                id: 11,
                content: "hi all".to_string(),
                message_type: MessageType::Text,
                sender: identity(),
                created_at: Utc::now(),
                is_read: false,
            },
        });

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "community_message");
        assert_eq!(json["data"]["communityId"], 42);
        assert_eq!(json["data"]["content"], "hi all");
    }

    #[test]
    fn test_typing_event_omits_absent_community() {
        let event = ServerEvent::UserTyping(TypingPayload {
            community_id: None,
            user_id: 1,
            user: identity(),
            is_typing: true,
        });

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "user_typing");
        assert_eq!(json["data"]["isTyping"], true);
        assert!(json["data"].get("communityId").is_none());
    }

    #[test]
    fn test_notification_push_uses_type_field() {
        let event = ServerEvent::NewNotification(NotificationPushPayload {
            notification_type: "new_message".to_string(),
            sender: identity(),
            preview: "hello".to_string(),
        });

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "new_notification");
        assert_eq!(json["data"]["type"], "new_message");
    }

    #[test]
    fn test_client_send_message_parses() {
        let raw = r#"{
            "event": "send_message",
            "data": {"receiverId": 2, "content": "hey", "messageType": "text"}
        }"#;

        let event: ClientEvent = serde_json::from_str(raw).expect("parse");
        match event {
            ClientEvent::SendMessage(payload) => {
                assert_eq!(payload.receiver_id, Some(2));
                assert_eq!(payload.community_id, None);
                assert_eq!(payload.content, "hey");
                assert_eq!(payload.message_type, MessageType::Text);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_client_message_type_defaults_to_text() {
        let raw = r#"{"event": "send_message", "data": {"receiverId": 2, "content": "hey"}}"#;

        let event: ClientEvent = serde_json::from_str(raw).expect("parse");
        match event {
            ClientEvent::SendMessage(payload) => {
                assert_eq!(payload.message_type, MessageType::Text)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_client_join_community_parses() {
        let raw = r#"{"event": "join_community", "data": {"communityId": 7}}"#;

        let event: ClientEvent = serde_json::from_str(raw).expect("parse");
        match event {
            ClientEvent::JoinCommunity(payload) => assert_eq!(payload.community_id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_server_event_names() {
        assert_eq!(ServerEvent::OnlineUsers(vec![]).name(), "online_users");
        assert_eq!(ServerEvent::error("x").name(), "message_error");
        assert_eq!(
            ServerEvent::MessageRead(MessageReadPayload { message_id: 1 }).name(),
            "message_read"
        );
    }
}

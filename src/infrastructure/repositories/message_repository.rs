//! Message Repository Implementation
//!
//! PostgreSQL implementation of the Message Store: inserts for direct and
//! community messages, read receipts, and sender lookups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Message, MessageRepository, MessageType, NewMessage};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    receiver_id: Option<i64>,
    community_id: Option<i64>,
    content: String,
    message_type: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            community_id: self.community_id,
            content: self.content,
            message_type: MessageType::from_str(&self.message_type),
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    /// Persist a message and return the stored row with its id and timestamp.
    async fn create(&self, message: &NewMessage) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, community_id, content, message_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sender_id, receiver_id, community_id, content,
                      message_type, is_read, created_at
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.community_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Mark a message read. The receiver filter makes the update a no-op when
    /// the reader is not the message's recipient.
    async fn mark_read(&self, message_id: i64, reader_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE id = $1 AND receiver_id = $2
            "#,
        )
        .bind(message_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn sender_of(&self, message_id: i64) -> Result<Option<i64>, AppError> {
        let sender: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT sender_id
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sender.map(|(id,)| id))
    }
}

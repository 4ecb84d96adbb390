//! Notification Repository Implementation
//!
//! PostgreSQL implementation of the Notification Store. Records are written
//! for every direct message regardless of whether the recipient is online.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{NewNotification, NotificationRepository};
use crate::shared::error::AppError;

/// PostgreSQL notification repository implementation.
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Creates a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, type, title, message, link, related_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.link)
        .bind(notification.related_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

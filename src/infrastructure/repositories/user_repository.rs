//! User Repository Implementation
//!
//! PostgreSQL implementation of user lookups and presence flag updates.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{UserIdentity, UserProfile, UserRepository};
use crate::shared::error::AppError;

/// PostgreSQL user repository implementation.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for identity queries.
#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    name: String,
    profile_picture: Option<String>,
}

impl IdentityRow {
    fn into_identity(self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            name: self.name,
            profile_picture: self.profile_picture,
        }
    }
}

/// Internal row type for profile queries.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    bio: Option<String>,
    location: Option<String>,
    profile_picture: Option<String>,
    user_type: Option<String>,
    is_online: bool,
}

impl ProfileRow {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            bio: self.bio,
            location: self.location,
            profile_picture: self.profile_picture,
            user_type: self.user_type,
            is_online: self.is_online,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    /// Minimal identity used in realtime payloads and the presence roster.
    async fn find_identity(&self, id: i64) -> Result<Option<UserIdentity>, AppError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, profile_picture
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_identity()))
    }

    /// Batch profile fetch for the people-match endpoint. Order is not
    /// preserved; callers reorder by id.
    async fn profiles_by_ids(&self, ids: &[i64]) -> Result<Vec<UserProfile>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, bio, location, profile_picture, user_type, is_online
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_profile()).collect())
    }

    /// Flip the persisted presence flag and stamp last activity.
    async fn set_presence(&self, id: i64, online: bool) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_online = $2, last_active = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(online)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

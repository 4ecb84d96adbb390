//! Community Repository Implementation
//!
//! PostgreSQL implementation of community membership checks and the
//! recommendation candidate pool.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Community, CommunityRepository};
use crate::shared::error::AppError;

/// PostgreSQL community repository implementation.
pub struct PgCommunityRepository {
    pool: PgPool,
}

impl PgCommunityRepository {
    /// Creates a new PgCommunityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for community queries.
#[derive(Debug, sqlx::FromRow)]
struct CommunityRow {
    id: i64,
    name: String,
    description: Option<String>,
    category: Option<String>,
    image_url: Option<String>,
    member_count: i32,
}

impl CommunityRow {
    fn into_community(self) -> Community {
        Community {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            member_count: self.member_count,
        }
    }
}

#[async_trait]
impl CommunityRepository for PgCommunityRepository {
    /// Membership check gating realtime channel joins.
    async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1
            FROM community_members
            WHERE community_id = $1 AND user_id = $2
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exists.is_some())
    }

    async fn joined_community_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT community_id
            FROM community_members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Candidate pool for recommendations. Joined communities are filtered in
    /// SQL so they never reach scoring; the pool is the ten most popular
    /// public communities that remain.
    async fn recommendation_pool(&self, excluded_ids: &[i64]) -> Result<Vec<Community>, AppError> {
        let rows = sqlx::query_as::<_, CommunityRow>(
            r#"
            SELECT id, name, description, category, image_url, member_count
            FROM communities
            WHERE is_private = FALSE AND id != ALL($1)
            ORDER BY member_count DESC, id ASC
            LIMIT 10
            "#,
        )
        .bind(excluded_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_community()).collect())
    }
}

//! Interest Repository Implementation
//!
//! PostgreSQL implementation of interest-set queries feeding the matching
//! engine: the reference user's interest ids, candidate users sharing them,
//! and interest names for display.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{CommunityInterestRow, InterestRepository, UserInterestRow};
use crate::shared::error::AppError;

/// PostgreSQL interest repository implementation.
pub struct PgInterestRepository {
    pool: PgPool,
}

impl PgInterestRepository {
    /// Creates a new PgInterestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterestRepository for PgInterestRepository {
    async fn user_interest_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT interest_id
            FROM user_interests
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Every (user, interest) pair for users who share at least one of the
    /// given interests. Candidates with zero overlap never appear, which
    /// keeps the people-match pool small before ranking.
    async fn users_sharing(
        &self,
        interest_ids: &[i64],
        exclude_user_id: i64,
    ) -> Result<Vec<UserInterestRow>, AppError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, interest_id
            FROM user_interests
            WHERE interest_id = ANY($1) AND user_id != $2
            "#,
        )
        .bind(interest_ids)
        .bind(exclude_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, interest_id)| UserInterestRow {
                user_id,
                interest_id,
            })
            .collect())
    }

    /// Interest names per user, for the matched-user cards.
    async fn interest_names_by_user(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, String)>, AppError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT ui.user_id, i.name
            FROM user_interests ui
            JOIN interests i ON i.id = ui.interest_id
            WHERE ui.user_id = ANY($1)
            ORDER BY ui.user_id, i.name
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Interest id and name pairs tagged to each community in the pool.
    async fn interests_by_community(
        &self,
        community_ids: &[i64],
    ) -> Result<Vec<CommunityInterestRow>, AppError> {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT ci.community_id, ci.interest_id, i.name
            FROM community_interests ci
            JOIN interests i ON i.id = ci.interest_id
            WHERE ci.community_id = ANY($1)
            ORDER BY ci.community_id, i.name
            "#,
        )
        .bind(community_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(community_id, interest_id, interest_name)| CommunityInterestRow {
                community_id,
                interest_id,
                interest_name,
            })
            .collect())
    }
}

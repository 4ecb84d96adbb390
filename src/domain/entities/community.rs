//! Community entity and repository trait.
//!
//! Maps to the `communities` and `community_members` tables. Full community
//! CRUD lives elsewhere; this backend needs the recommendation pool and a
//! membership check for realtime channel joins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A community as returned by the recommendation pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub member_count: i32,
}

/// Repository trait for community data access.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Whether the user belongs to the community. Gates realtime channel joins.
    async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Ids of the communities the user has already joined.
    async fn joined_community_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Candidate pool for recommendations: public communities the user has
    /// not joined, ordered by member count descending, capped at 10.
    /// Excluded communities never reach scoring.
    async fn recommendation_pool(&self, excluded_ids: &[i64]) -> Result<Vec<Community>, AppError>;
}

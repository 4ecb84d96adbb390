//! Interest-membership rows and repository trait.
//!
//! Maps to the `user_interests`, `community_interests`, and `interests`
//! tables. The matching engine consumes these facts; it never queries the
//! store itself.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// One (user, interest) membership fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInterestRow {
    pub user_id: i64,
    pub interest_id: i64,
}

/// One (community, interest) membership fact with the display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityInterestRow {
    pub community_id: i64,
    pub interest_id: i64,
    pub interest_name: String,
}

/// Repository trait for interest-membership facts (the Interest Membership
/// Store).
#[async_trait]
pub trait InterestRepository: Send + Sync {
    /// Interest ids held by a user.
    async fn user_interest_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Membership facts for every user (except `exclude_user_id`) holding at
    /// least one of `interest_ids`. This is the people-match candidate
    /// source: users sharing zero interests never appear.
    async fn users_sharing(
        &self,
        interest_ids: &[i64],
        exclude_user_id: i64,
    ) -> Result<Vec<UserInterestRow>, AppError>;

    /// Display names of each user's interests, for the match payload.
    async fn interest_names_by_user(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, String)>, AppError>;

    /// Interest facts for a set of communities, with display names.
    async fn interests_by_community(
        &self,
        community_ids: &[i64],
    ) -> Result<Vec<CommunityInterestRow>, AppError>;
}

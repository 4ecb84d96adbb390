//! Match Service
//!
//! Runs the interest-overlap ranking engine against store facts for the two
//! ranking endpoints: people matches and community recommendations. Stateless
//! per request; the engine itself never touches the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::services::matching::{self, Candidate};
use crate::domain::{Community, CommunityRepository, InterestRepository, UserProfile, UserRepository};
use crate::shared::error::AppError;

/// Match service trait
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Rank other users by shared interests with the given user.
    async fn find_matches(&self, user_id: i64) -> Result<MatchesResponse, AppError>;

    /// Rank public communities the user has not joined by shared interests.
    async fn recommend_communities(&self, user_id: i64) -> Result<RecommendationsResponse, AppError>;
}

/// A matched user with their score and display interests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMatch {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub interests: Vec<String>,
    pub match_score: u8,
}

/// People-match endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<UserMatch>,
    /// Set when the user has no interests yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A recommended community with its score and display interests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRecommendation {
    #[serde(flatten)]
    pub community: Community,
    pub interests: Vec<String>,
    pub match_score: u8,
}

/// Community recommendation endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<CommunityRecommendation>,
}

/// MatchService implementation over the store repositories.
pub struct MatchServiceImpl<U, I, C>
where
    U: UserRepository,
    I: InterestRepository,
    C: CommunityRepository,
{
    user_repo: Arc<U>,
    interest_repo: Arc<I>,
    community_repo: Arc<C>,
}

impl<U, I, C> MatchServiceImpl<U, I, C>
where
    U: UserRepository,
    I: InterestRepository,
    C: CommunityRepository,
{
    pub fn new(user_repo: Arc<U>, interest_repo: Arc<I>, community_repo: Arc<C>) -> Self {
        Self {
            user_repo,
            interest_repo,
            community_repo,
        }
    }
}

#[async_trait]
impl<U, I, C> MatchService for MatchServiceImpl<U, I, C>
where
    U: UserRepository + 'static,
    I: InterestRepository + 'static,
    C: CommunityRepository + 'static,
{
    async fn find_matches(&self, user_id: i64) -> Result<MatchesResponse, AppError> {
        let reference_ids = self.interest_repo.user_interest_ids(user_id).await?;
        if reference_ids.is_empty() {
            return Ok(MatchesResponse {
                matches: Vec::new(),
                message: Some("Add some interests to find matches!".to_string()),
            });
        }
        let reference: HashSet<i64> = reference_ids.iter().copied().collect();

        // Candidate sourcing already excludes users with zero shared
        // interests; the engine caps to the top 10 by raw overlap.
        let rows = self.interest_repo.users_sharing(&reference_ids, user_id).await?;
        let mut interests_by_user: HashMap<i64, HashSet<i64>> = HashMap::new();
        for row in rows {
            interests_by_user
                .entry(row.user_id)
                .or_default()
                .insert(row.interest_id);
        }

        let candidates: Vec<Candidate> = interests_by_user
            .into_iter()
            .map(|(id, interest_ids)| Candidate { id, interest_ids })
            .collect();

        let ranked = matching::rank_people(&reference, &candidates);
        if ranked.is_empty() {
            return Ok(MatchesResponse {
                matches: Vec::new(),
                message: None,
            });
        }

        let ids: Vec<i64> = ranked.iter().map(|r| r.id).collect();
        let profiles: HashMap<i64, UserProfile> = self
            .user_repo
            .profiles_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut names_by_user: HashMap<i64, Vec<String>> = HashMap::new();
        for (id, name) in self.interest_repo.interest_names_by_user(&ids).await? {
            names_by_user.entry(id).or_default().push(name);
        }

        let matches = ranked
            .into_iter()
            .filter_map(|r| {
                // A candidate whose profile row vanished between queries is
                // silently skipped.
                let profile = profiles.get(&r.id).cloned()?;
                Some(UserMatch {
                    profile,
                    interests: names_by_user.remove(&r.id).unwrap_or_default(),
                    match_score: r.score,
                })
            })
            .collect();

        Ok(MatchesResponse {
            matches,
            message: None,
        })
    }

    async fn recommend_communities(&self, user_id: i64) -> Result<RecommendationsResponse, AppError> {
        let reference_ids = self.interest_repo.user_interest_ids(user_id).await?;
        let joined = self.community_repo.joined_community_ids(user_id).await?;

        // Already-joined communities are excluded from the pool before
        // scoring; they never appear regardless of score.
        let pool = self.community_repo.recommendation_pool(&joined).await?;
        if pool.is_empty() {
            return Ok(RecommendationsResponse {
                recommendations: Vec::new(),
            });
        }

        let pool_ids: Vec<i64> = pool.iter().map(|c| c.id).collect();
        let mut interest_ids_by_community: HashMap<i64, HashSet<i64>> = HashMap::new();
        let mut names_by_community: HashMap<i64, Vec<String>> = HashMap::new();
        for row in self.interest_repo.interests_by_community(&pool_ids).await? {
            interest_ids_by_community
                .entry(row.community_id)
                .or_default()
                .insert(row.interest_id);
            names_by_community
                .entry(row.community_id)
                .or_default()
                .push(row.interest_name);
        }

        let communities_by_id: HashMap<i64, Community> =
            pool.iter().map(|c| (c.id, c.clone())).collect();

        // With no interests there is nothing to normalize against: the pool
        // is returned in popularity order with a flat 0% score instead of
        // being hidden.
        if reference_ids.is_empty() {
            let recommendations = pool
                .into_iter()
                .map(|community| {
                    let interests = names_by_community.remove(&community.id).unwrap_or_default();
                    CommunityRecommendation {
                        community,
                        interests,
                        match_score: 0,
                    }
                })
                .collect();
            return Ok(RecommendationsResponse { recommendations });
        }

        let reference: HashSet<i64> = reference_ids.into_iter().collect();
        let candidates: Vec<Candidate> = pool
            .iter()
            .map(|c| Candidate {
                id: c.id,
                interest_ids: interest_ids_by_community
                    .get(&c.id)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        let recommendations = matching::rank(&reference, &candidates)
            .into_iter()
            .filter_map(|r| {
                let community = communities_by_id.get(&r.id).cloned()?;
                Some(CommunityRecommendation {
                    community,
                    interests: names_by_community.remove(&r.id).unwrap_or_default(),
                    match_score: r.score,
                })
            })
            .collect();

        Ok(RecommendationsResponse { recommendations })
    }
}

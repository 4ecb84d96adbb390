//! Community Recommendation Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};

use crate::application::services::{MatchService, MatchServiceImpl, RecommendationsResponse};
use crate::infrastructure::repositories::{
    PgCommunityRepository, PgInterestRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Rank public communities the authenticated user has not joined.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let interest_repo = Arc::new(PgInterestRepository::new(state.db.clone()));
    let community_repo = Arc::new(PgCommunityRepository::new(state.db.clone()));
    let match_service = MatchServiceImpl::new(user_repo, interest_repo, community_repo);

    let response = match_service.recommend_communities(auth.user_id).await?;

    Ok(Json(response))
}

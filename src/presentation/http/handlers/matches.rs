//! People Match Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};

use crate::application::services::{MatchService, MatchServiceImpl, MatchesResponse};
use crate::infrastructure::repositories::{
    PgCommunityRepository, PgInterestRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Rank other users by shared interests with the authenticated user.
pub async fn get_matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MatchesResponse>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let interest_repo = Arc::new(PgInterestRepository::new(state.db.clone()));
    let community_repo = Arc::new(PgCommunityRepository::new(state.db.clone()));
    let match_service = MatchServiceImpl::new(user_repo, interest_repo, community_repo);

    let response = match_service.find_matches(auth.user_id).await?;

    Ok(Json(response))
}

//! Application Services

pub mod match_service;

pub use match_service::{
    CommunityRecommendation, MatchService, MatchServiceImpl, MatchesResponse,
    RecommendationsResponse, UserMatch,
};

//! User identity and repository trait.
//!
//! Maps to the `users` table. Account management (registration, password
//! hashing, OAuth) belongs to the external auth service; this backend only
//! reads user rows and flips the presence flag.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Minimal user identity carried by the realtime hub.
///
/// Denormalized snapshot taken at connect time: a display-name change made
/// while connected is not reflected until the next connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: i64,
    pub name: String,
    pub profile_picture: Option<String>,
}

/// Public profile fields returned by the match endpoint.
///
/// Maps to the `users` table columns the dashboard displays:
/// - id: BIGINT PRIMARY KEY
/// - name: VARCHAR NOT NULL
/// - bio: TEXT NULL
/// - location: VARCHAR NULL
/// - profile_picture: TEXT NULL
/// - user_type: VARCHAR NULL
/// - is_online: BOOLEAN DEFAULT FALSE
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub user_type: Option<String>,
    pub is_online: bool,
}

/// Repository trait for user data access (the User Directory).
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Resolve a user id to the minimal identity used in realtime payloads.
    async fn find_identity(&self, id: i64) -> Result<Option<UserIdentity>, AppError>;

    /// Fetch public profiles for a set of user ids.
    async fn profiles_by_ids(&self, ids: &[i64]) -> Result<Vec<UserProfile>, AppError>;

    /// Update the durable online flag and last-active timestamp.
    async fn set_presence(&self, id: i64, online: bool) -> Result<(), AppError>;
}

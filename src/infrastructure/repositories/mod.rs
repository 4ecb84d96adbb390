//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits. Each
//! repository owns a clone of the shared connection pool and handles data
//! access for one entity type.

pub mod community_repository;
pub mod interest_repository;
pub mod message_repository;
pub mod notification_repository;
pub mod user_repository;

pub use community_repository::PgCommunityRepository;
pub use interest_repository::PgInterestRepository;
pub use message_repository::PgMessageRepository;
pub use notification_repository::PgNotificationRepository;
pub use user_repository::PgUserRepository;

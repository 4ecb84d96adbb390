//! Domain Entities
//!
//! Core entities and their repository traits.

pub mod community;
pub mod interest;
pub mod message;
pub mod notification;
pub mod user;

pub use community::{Community, CommunityRepository};
pub use interest::{CommunityInterestRow, InterestRepository, UserInterestRow};
pub use message::{Message, MessageRepository, MessageType, NewMessage};
pub use notification::{NewNotification, NotificationRepository, NotificationType};
pub use user::{UserIdentity, UserProfile, UserRepository};

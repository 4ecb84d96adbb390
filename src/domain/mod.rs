//! # Domain Layer
//!
//! The domain layer contains the core business logic of InterestConnect.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (UserIdentity, Message, Community, etc.)
//! - **services**: Pure domain services (interest-overlap matching)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define the contracts to the external stores
//! - The matching engine is pure and synchronous

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;

//! # InterestConnect Backend
//!
//! This crate provides the realtime and matching core of the InterestConnect
//! social network:
//! - WebSocket hub for presence, direct/community messaging, typing
//!   indicators, and read receipts
//! - Interest-overlap ranking engine behind the match and community
//!   recommendation endpoints
//! - PostgreSQL for persistent storage of messages and notifications
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities, repository traits, and the pure
//!   matching service
//! - **Application Layer**: Chat routing and match query services
//! - **Infrastructure Layer**: Database repositories and metrics
//! - **Presentation Layer**: HTTP handlers and the realtime hub
//!
//! ## Module Structure
//!
//! ```text
//! interest_connect/
//! +-- config/         Configuration management
//! +-- domain/         Entities, repository traits, matching engine
//! +-- application/    Chat and match services
//! +-- infrastructure/ Database repositories and metrics
//! +-- presentation/   HTTP routes, middleware, realtime hub
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and realtime handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;

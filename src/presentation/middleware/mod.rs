//! Middleware Module
//!
//! JWT authentication and CORS configuration.

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, AuthUser};
pub use cors::create_cors_layer;

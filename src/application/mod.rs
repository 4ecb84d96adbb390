//! # Application Layer
//!
//! Services that orchestrate domain logic against the repository traits.

pub mod services;

pub use services::*;

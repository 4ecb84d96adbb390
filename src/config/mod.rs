//! Configuration Module
//!
//! Layered application configuration.

pub mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, JwtSettings, RealtimeSettings, ServerSettings, Settings,
};

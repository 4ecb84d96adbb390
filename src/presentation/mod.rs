//! Presentation Layer
//!
//! HTTP routes and the realtime hub handlers.

pub mod http;
pub mod middleware;
pub mod realtime;

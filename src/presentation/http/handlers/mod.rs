//! HTTP Request Handlers

pub mod communities;
pub mod health;
pub mod matches;

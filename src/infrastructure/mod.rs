//! Infrastructure Layer
//!
//! Database access, Prometheus metrics, and the SQL-backed repository
//! implementations of the domain traits.

pub mod database;
pub mod metrics;
pub mod repositories;

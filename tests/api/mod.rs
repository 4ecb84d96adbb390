//! API and realtime flow tests.

mod health_tests;
mod realtime_tests;

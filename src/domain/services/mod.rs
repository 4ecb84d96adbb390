//! Domain Services
//!
//! Pure business logic with no infrastructure dependencies.

pub mod matching;

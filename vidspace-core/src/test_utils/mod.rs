//! Test utilities and helpers for vidspace
//!
//! Fixtures that seed an in-memory store and build request contexts, plus
//! assertion helpers for access outcomes. Shared by unit tests, the
//! integration tests and the API crate's tests.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

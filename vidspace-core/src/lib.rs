//! Core of the vidspace video-sharing backend
//!
//! The access engine lives in [`core_access`]; the remaining modules are the
//! ambient stack shared by the API server and the admin CLI.

pub mod config;
pub mod core_access;
pub mod logging;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use core_access::{AccessError, AccessResult, AccessService, AccessSqlStore};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};

//! Logging subsystem for vidspace
//!
//! A single `tracing` subscriber per process: an `EnvFilter` (RUST_LOG wins
//! over the configured level) plus a plain or JSON fmt layer.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub with_timestamp: bool,
    /// Whether to include target module information
    pub with_target: bool,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Create a new LogConfig with specified level
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set whether to include timestamps
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    /// Set whether to include target information
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Set whether to use JSON formatting
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

impl TryFrom<&LoggingConfig> for LogConfig {
    type Error = LoggingError;

    fn try_from(config: &LoggingConfig) -> Result<Self, Self::Error> {
        Ok(LogConfig::new(config.level.parse()?)
            .with_timestamp(config.with_timestamp)
            .with_target(config.with_target)
            .json_format(config.json_format))
    }
}

/// Initialize the logging subsystem with default configuration
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize the logging subsystem with custom configuration
///
/// # Example
/// ```
/// use vidspace_core::logging::{init_logging_with_config, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug)
///     .with_timestamp(true)
///     .with_target(false);
///
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let fmt_layer = fmt::layer().with_target(config.with_target);

    let output: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.json_format, config.with_timestamp) {
            (true, true) => fmt_layer.json().boxed(),
            (true, false) => fmt_layer.json().without_time().boxed(),
            (false, true) => fmt_layer.boxed(),
            (false, false) => fmt_layer.without_time().boxed(),
        };

    tracing_subscriber::registry()
        .with(output)
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.with_timestamp);
        assert!(config.with_target);
        assert!(!config.json_format);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new(LogLevel::Debug)
            .with_timestamp(false)
            .with_target(false)
            .json_format(true);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.with_timestamp);
        assert!(!config.with_target);
        assert!(config.json_format);
    }

    #[test]
    fn test_log_config_from_settings() {
        let settings = LoggingConfig {
            level: "warn".to_string(),
            json_format: true,
            ..LoggingConfig::default()
        };

        let config = LogConfig::try_from(&settings).unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.json_format);

        let bad = LoggingConfig { level: "loud".to_string(), ..LoggingConfig::default() };
        assert!(LogConfig::try_from(&bad).is_err());
    }
}

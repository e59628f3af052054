//! Configuration management for vidspace
//!
//! Configuration is loaded from a TOML file, then overridden from
//! `VIDSPACE_<SECTION>_<KEY>` environment variables, then validated.

use crate::core_access::context::DEFAULT_TENANT_HEADER;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "VIDSPACE";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// gRPC server configuration
    pub server: ServerConfig,

    /// Store configuration
    pub store: StoreConfig,

    /// Token verification
    pub auth: AuthConfig,

    /// Video listing pagination
    pub listing: ListingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Metadata key carrying the tenant id
    pub tenant_header: String,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// Use a throwaway in-memory database instead of `database_path`
    pub in_memory: bool,
}

/// Token verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity provider
    pub jwt_secret: Option<String>,

    /// Expected `iss` claim, if any
    pub jwt_issuer: Option<String>,

    /// Expected `aud` claim, if any
    pub jwt_audience: Option<String>,

    /// Allowed clock skew when checking `exp`
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,

    /// Lifetime of tokens minted by the CLI for local testing
    #[serde(with = "humantime_serde")]
    pub dev_token_ttl: Duration,
}

/// Pagination bounds for video listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page size used when the request asks for 0
    pub default_page_size: u32,

    /// Upper bound on any requested page size
    pub max_page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve a Prometheus scrape endpoint
    pub enabled: bool,

    /// Scrape endpoint bind address
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 50051)),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/vidspace.db"),
            pool_size: 8,
            in_memory: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
            leeway: Duration::from_secs(30),
            dev_token_ttl: Duration::from_secs(3600),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ListingConfig {
    /// Translate a 1-based page request into `(limit, offset)`.
    ///
    /// A page size of 0 means the default; anything above the maximum is
    /// clamped. Page 0 is treated as page 1.
    pub fn page_bounds(&self, page_size: u32, page_number: u32) -> (u32, u64) {
        let limit = match page_size {
            0 => self.default_page_size,
            n => n.min(self.max_page_size),
        };
        let page = u64::from(page_number.max(1));
        (limit, (page - 1) * u64::from(limit))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    what: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", what, e))),
        None => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: VIDSPACE_<SECTION>_<KEY>
    /// Example: VIDSPACE_SERVER_BIND_ADDRESS=0.0.0.0:50051
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// File (when given) with environment overrides on top
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// Like [`Config::load`], reading overrides through `lookup`. The merged
    /// result is validated once, after the overrides.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply `VIDSPACE_*` overrides obtained through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Server config
        if let Some(addr) = parse_var(&lookup, "VIDSPACE_SERVER_BIND_ADDRESS", "bind address")? {
            self.server.bind_address = addr;
        }
        if let Some(header) = lookup("VIDSPACE_SERVER_TENANT_HEADER") {
            self.server.tenant_header = header;
        }

        // Store config
        if let Some(path) = lookup("VIDSPACE_STORE_DATABASE_PATH") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(size) = parse_var(&lookup, "VIDSPACE_STORE_POOL_SIZE", "pool size")? {
            self.store.pool_size = size;
        }
        if let Some(flag) = parse_var(&lookup, "VIDSPACE_STORE_IN_MEMORY", "in-memory flag")? {
            self.store.in_memory = flag;
        }

        // Auth config
        if let Some(secret) = lookup("VIDSPACE_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(issuer) = lookup("VIDSPACE_AUTH_JWT_ISSUER") {
            self.auth.jwt_issuer = Some(issuer);
        }
        if let Some(audience) = lookup("VIDSPACE_AUTH_JWT_AUDIENCE") {
            self.auth.jwt_audience = Some(audience);
        }

        // Listing config
        if let Some(size) =
            parse_var(&lookup, "VIDSPACE_LISTING_DEFAULT_PAGE_SIZE", "default page size")?
        {
            self.listing.default_page_size = size;
        }
        if let Some(size) = parse_var(&lookup, "VIDSPACE_LISTING_MAX_PAGE_SIZE", "max page size")? {
            self.listing.max_page_size = size;
        }

        // Logging config
        if let Some(level) = lookup("VIDSPACE_LOGGING_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_var(&lookup, "VIDSPACE_LOGGING_JSON", "JSON flag")? {
            self.logging.json_format = json;
        }

        // Metrics config
        if let Some(enabled) = parse_var(&lookup, "VIDSPACE_METRICS_ENABLED", "metrics flag")? {
            self.metrics.enabled = enabled;
        }
        if let Some(addr) =
            parse_var(&lookup, "VIDSPACE_METRICS_BIND_ADDRESS", "metrics address")?
        {
            self.metrics.bind_address = addr;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server config
        let header = self.server.tenant_header.as_str();
        if header.is_empty() || header.bytes().any(|b| !(b.is_ascii_alphanumeric() || b == b'-' || b == b'_')) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid tenant header: {:?}",
                self.server.tenant_header
            )));
        }

        // Validate store config
        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        // Validate auth config
        if matches!(self.auth.jwt_secret.as_deref(), Some("")) {
            return Err(ConfigError::ValidationFailed(
                "jwt_secret must not be empty when set".to_string(),
            ));
        }

        // Validate listing config
        if self.listing.default_page_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.listing.max_page_size < self.listing.default_page_size {
            return Err(ConfigError::ValidationFailed(
                "max_page_size must be at least default_page_size".to_string(),
            ));
        }

        // Validate logging config
        if LogLevel::from_str(&self.logging.level).is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

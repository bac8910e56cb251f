//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PLANBOOK_BASE_URL` - Public URL of the site (`https://` enables secure cookies)
//!
//! ## Optional
//! - `PLANBOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `PLANBOOK_PORT` - Listen port (default: 3000)
//! - `PLANBOOK_AUTH_PATH` - Authentication entry point (default: /auth)
//! - `PLANBOOK_USERS_FILE` - JSON file of users loaded at startup
//! - `PLANBOOK_SESSION_HOURS` - Session inactivity expiry (default: 168)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use planbook_core::{AccessGate, Location};
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: Url,
    /// Where unauthenticated viewers are sent
    pub auth_path: Location,
    /// Optional seed file for the user directory
    pub users_file: Option<PathBuf>,
    /// Session inactivity expiry in hours
    pub session_hours: i64,
    /// Sentry configuration
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment name reported with events
    pub environment: Option<String>,
    /// Fraction of error events sent
    pub sample_rate: f32,
    /// Fraction of transactions traced
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env(
            "PLANBOOK_HOST",
            &get_env_or_default("PLANBOOK_HOST", "127.0.0.1"),
        )?;
        let port = parse_env("PLANBOOK_PORT", &get_env_or_default("PLANBOOK_PORT", "3000"))?;
        let base_url = parse_base_url(&get_required_env("PLANBOOK_BASE_URL")?)?;
        let auth_path = parse_auth_path(&get_env_or_default(
            "PLANBOOK_AUTH_PATH",
            AccessGate::DEFAULT_AUTH_PATH,
        ))?;
        let users_file = get_optional_env("PLANBOOK_USERS_FILE").map(PathBuf::from);
        let session_hours =
            parse_session_hours(&get_env_or_default("PLANBOOK_SESSION_HOURS", "168"))?;

        Ok(Self {
            host,
            port,
            base_url,
            auth_path,
            users_file,
            session_hours,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .map(|v| parse_rate("SENTRY_SAMPLE_RATE", &v))
                .transpose()?
                .unwrap_or(defaults.sample_rate),
            traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .map(|v| parse_rate("SENTRY_TRACES_SAMPLE_RATE", &v))
                .transpose()?
                .unwrap_or(defaults.traces_sample_rate),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar("PLANBOOK_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "PLANBOOK_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_auth_path(value: &str) -> Result<Location, ConfigError> {
    Location::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar("PLANBOOK_AUTH_PATH".to_string(), e.to_string()))
}

fn parse_session_hours(value: &str) -> Result<i64, ConfigError> {
    let hours: i64 = parse_env("PLANBOOK_SESSION_HOURS", value)?;
    if hours <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            "PLANBOOK_SESSION_HOURS".to_string(),
            "must be positive".to_string(),
        ));
    }
    Ok(hours)
}

/// Parse a sample rate, which must lie in `[0, 1]`.
fn parse_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_env(key, value)?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{rate} is outside [0, 1]"),
        ));
    }
    Ok(rate)
}

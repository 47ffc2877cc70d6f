//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults give a self-contained server
//! backed by an in-memory database and the public ViaCEP service.
//!
//! - `REGISTRY_DATABASE_URL` - `SQLite` connection string (default: `sqlite::memory:`,
//!   falls back to `DATABASE_URL`)
//! - `REGISTRY_HOST` - Bind address (default: 127.0.0.1)
//! - `REGISTRY_PORT` - Listen port (default: 8080)
//! - `POSTAL_LOOKUP_URL` - Base URL of the postal lookup service
//!   (default: <https://viacep.com.br/ws>)
//! - `POSTAL_LOOKUP_TIMEOUT_SECS` - Lookup request timeout (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_LOOKUP_URL: &str = "https://viacep.com.br/ws";
const DEFAULT_LOOKUP_TIMEOUT_SECS: &str = "5";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Postal lookup service configuration
    pub postal: PostalLookupConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Postal lookup service configuration.
#[derive(Debug, Clone)]
pub struct PostalLookupConfig {
    /// Base URL; requests go to `{base_url}/{postal_code}/json/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = vars("REGISTRY_DATABASE_URL")
            .or_else(|| vars("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let host = get_or_default(&vars, "REGISTRY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("REGISTRY_HOST".to_string(), e.to_string()))?;
        let port = get_or_default(&vars, "REGISTRY_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("REGISTRY_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            postal: PostalLookupConfig::from_vars(&vars)?,
            sentry_dsn: vars("SENTRY_DSN"),
            sentry_environment: vars("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PostalLookupConfig {
    fn from_vars(vars: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_or_default(vars, "POSTAL_LOOKUP_URL", DEFAULT_LOOKUP_URL);
        let base_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("POSTAL_LOOKUP_URL".to_string(), e))?;

        let timeout_secs = get_or_default(vars, "POSTAL_LOOKUP_TIMEOUT_SECS", DEFAULT_LOOKUP_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| e.to_string())
            .and_then(|secs| {
                if secs == 0 {
                    Err("timeout must be at least 1 second".to_string())
                } else {
                    Ok(secs)
                }
            })
            .map_err(|e| ConfigError::InvalidEnvVar("POSTAL_LOOKUP_TIMEOUT_SECS".to_string(), e))?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing at an explicit base URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an absolute http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("POSTAL_LOOKUP_URL".to_string(), e))?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(5),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default(vars: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    vars(key).unwrap_or_else(|| default.to_string())
}

/// Parse and normalise the lookup base URL (no trailing slash).
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim_end_matches('/')).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    Ok(url)
}

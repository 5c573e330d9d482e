//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `HUB_API_URL` - Base URL of the hub catalog/order API
//! - `HUB_ID` - Hub (tenant) identifier this storefront serves
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SEARCH_DEBOUNCE_MS` - Search input debounce window (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Hub API configuration
    pub hub: HubConfig,
    /// Debounce window applied to search input before hitting the hub
    pub search_debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hub API configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL of the hub API (e.g., `https://hub.example.com/api`)
    pub api_url: Url,
    /// Tenant identifier; every hub request is scoped to this id
    pub hub_id: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let search_debounce_ms = get_env_or_default("SEARCH_DEBOUNCE_MS", "300")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SEARCH_DEBOUNCE_MS".to_string(), e.to_string())
            })?;

        let hub = HubConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            hub,
            search_debounce: Duration::from_millis(search_debounce_ms),
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl HubConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("HUB_API_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("HUB_API_URL".to_string(), e.to_string()))?;
        let hub_id = get_required_env("HUB_ID")?;
        if hub_id.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "HUB_ID".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(Self { api_url, hub_id })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            hub: HubConfig {
                api_url: "https://hub.example.com/api".parse().unwrap(),
                hub_id: "42".to_string(),
            },
            search_debounce: Duration::from_millis(300),
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("HUB_ID".to_string());
        assert_eq!(err.to_string(), "Missing environment variable: HUB_ID");

        let err = ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable STOREFRONT_PORT: bad"
        );
    }
}

//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CORNERSHOP_API_URL` - Base URL of the backend REST API
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `CORNERSHOP_API_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `ADMIN_ORDERS_PER_PAGE` - Rows per page in the orders table (default: 20)
//! - `ADMIN_CURRENCY_SYMBOL` - Price prefix (default: $)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use cornershop_core::DEFAULT_CURRENCY_SYMBOL;
use thiserror::Error;

const DEFAULT_ORDERS_PER_PAGE: u32 = 20;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Backend REST API base URL
    pub api_url: String,
    /// Backend request timeout
    pub api_timeout: Duration,
    /// Rows per page in the orders table
    pub orders_per_page: u32,
    /// Prefix used when formatting prices
    pub currency_symbol: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: parse_or_default(&lookup, "ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or_default(&lookup, "ADMIN_PORT", 3001_u16)?,
            base_url: get_http_url(&lookup, "ADMIN_BASE_URL")?,
            api_url: get_http_url(&lookup, "CORNERSHOP_API_URL")?,
            api_timeout: Duration::from_secs(parse_or_default(
                &lookup,
                "CORNERSHOP_API_TIMEOUT_SECS",
                15_u64,
            )?),
            orders_per_page: parse_or_default(
                &lookup,
                "ADMIN_ORDERS_PER_PAGE",
                DEFAULT_ORDERS_PER_PAGE,
            )?
            .max(1),
            currency_symbol: lookup("ADMIN_CURRENCY_SYMBOL")
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
            sentry_dsn: lookup("SENTRY_DSN").filter(|s| !s.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or_default(&lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required `http` or `https` URL, without a trailing slash.
fn get_http_url(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(lookup, key)?;
    let url = url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http or https URL".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        _ => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("ADMIN_BASE_URL", "http://localhost:3001"),
            ("CORNERSHOP_API_URL", "http://localhost:5000/api"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.orders_per_page, 20);
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.api_timeout, Duration::from_secs(15));
        assert!(!config.is_secure());
    }

    #[test]
    fn test_requires_api_url() {
        let err = AdminConfig::from_lookup(lookup(&[("ADMIN_BASE_URL", "http://localhost:3001")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CORNERSHOP_API_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("ADMIN_BASE_URL", "https://admin.example.com/"),
            ("CORNERSHOP_API_URL", "http://localhost:5000/api"),
            ("ADMIN_PORT", "8081"),
            ("ADMIN_ORDERS_PER_PAGE", "50"),
        ]))
        .unwrap();
        assert!(config.is_secure());
        assert_eq!(config.base_url, "https://admin.example.com");
        assert_eq!(config.port, 8081);
        assert_eq!(config.orders_per_page, 50);
    }
}

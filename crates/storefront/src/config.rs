//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CORNERSHOP_API_URL` - Base URL of the backend REST API (e.g. `http://localhost:5000/api`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CORNERSHOP_API_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `STOREFRONT_PRODUCTS_PER_PAGE` - Catalog page size (default: 12)
//! - `STOREFRONT_RECENTLY_VIEWED_LIMIT` - Recently viewed products kept (default: 8)
//! - `STOREFRONT_OFFER_CACHE_TTL_SECS` - Offer banner cache lifetime (default: 300)
//! - `STOREFRONT_WISHLIST_POLL_SECS` - Wishlist button refresh interval (default: 30)
//! - `STOREFRONT_CURRENCY_SYMBOL` - Price prefix (default: $)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use cornershop_core::DEFAULT_CURRENCY_SYMBOL;
use thiserror::Error;

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
    /// Backend API connection
    pub api: ApiConfig,
    /// Display and caching knobs
    pub shop: ShopConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Storefront behaviour that operators may tune.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    pub products_per_page: u32,
    pub recently_viewed_limit: usize,
    pub offer_cache_ttl: Duration,
    pub wishlist_poll_secs: u64,
    pub currency_symbol: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            products_per_page: 12,
            recently_viewed_limit: cornershop_core::recent::DEFAULT_CAPACITY,
            offer_cache_ttl: Duration::from_secs(300),
            wishlist_poll_secs: 30,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_or_default(&lookup, "STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or_default(&lookup, "STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_http_url(&lookup, "STOREFRONT_BASE_URL")?;

        let api = ApiConfig {
            base_url: get_http_url(&lookup, "CORNERSHOP_API_URL")?,
            timeout: Duration::from_secs(parse_or_default(
                &lookup,
                "CORNERSHOP_API_TIMEOUT_SECS",
                15_u64,
            )?),
        };

        let defaults = ShopConfig::default();
        let shop = ShopConfig {
            products_per_page: parse_or_default(
                &lookup,
                "STOREFRONT_PRODUCTS_PER_PAGE",
                defaults.products_per_page,
            )?
            .max(1),
            recently_viewed_limit: parse_or_default(
                &lookup,
                "STOREFRONT_RECENTLY_VIEWED_LIMIT",
                defaults.recently_viewed_limit,
            )?,
            offer_cache_ttl: Duration::from_secs(parse_or_default(
                &lookup,
                "STOREFRONT_OFFER_CACHE_TTL_SECS",
                defaults.offer_cache_ttl.as_secs(),
            )?),
            wishlist_poll_secs: parse_or_default(
                &lookup,
                "STOREFRONT_WISHLIST_POLL_SECS",
                defaults.wishlist_poll_secs,
            )?
            .max(1),
            currency_symbol: lookup("STOREFRONT_CURRENCY_SYMBOL")
                .unwrap_or(defaults.currency_symbol),
        };

        Ok(Self {
            host,
            port,
            base_url,
            api,
            shop,
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

/// Get a required variable.
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

/// Parse a variable, falling back to `default` when unset.
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

    const REQUIRED: [(&str, &str); 2] = [
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ("CORNERSHOP_API_URL", "http://localhost:5000/api/"),
    ];

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout, Duration::from_secs(15));
        assert_eq!(config.shop.products_per_page, 12);
        assert_eq!(config.shop.recently_viewed_limit, 8);
        assert_eq!(config.shop.offer_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.shop.wishlist_poll_secs, 30);
        assert_eq!(config.shop.currency_symbol, "$");
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_required() {
        let err = StorefrontConfig::from_lookup(lookup(&REQUIRED[..1])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CORNERSHOP_API_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_PORT", "eighty"));
        let err = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"));

        let pairs = [
            ("STOREFRONT_BASE_URL", "ftp://shop.example.com"),
            ("CORNERSHOP_API_URL", "http://localhost:5000/api"),
        ];
        let err = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("STOREFRONT_BASE_URL", "https://shop.example.com"),
            ("STOREFRONT_PRODUCTS_PER_PAGE", "0"),
            ("STOREFRONT_CURRENCY_SYMBOL", "€"),
            ("SENTRY_DSN", ""),
        ]);
        let config = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.is_secure());
        assert_eq!(config.shop.products_per_page, 1);
        assert_eq!(config.shop.currency_symbol, "€");
        assert!(config.sentry_dsn.is_none());
    }
}

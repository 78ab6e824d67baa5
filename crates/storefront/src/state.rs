//! Application state shared across handlers.

use std::sync::Arc;

use cornershop_core::client::{ApiClient, ApiError};

use crate::backend::ShopApi;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ShopApi,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api.base_url, config.api.timeout)?;
        let api = ShopApi::new(client, config.shop.offer_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ShopApi {
        &self.inner.api
    }

    /// Currency symbol prices are formatted with.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.inner.config.shop.currency_symbol
    }
}

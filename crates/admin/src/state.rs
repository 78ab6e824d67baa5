//! Application state shared across handlers.

use std::sync::Arc;

use cornershop_core::client::{ApiClient, ApiError};

use crate::backend::AdminApi;
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: AdminApi,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api_url, config.api_timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api: AdminApi::new(client),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &AdminApi {
        &self.inner.api
    }

    /// Currency symbol prices are formatted with.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.inner.config.currency_symbol
    }
}

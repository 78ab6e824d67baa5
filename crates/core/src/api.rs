//! The backend's response envelope.
//!
//! Every endpoint answers `{ "success": bool, "data": T?, "message": string? }`.

use serde::{Deserialize, Serialize};

/// Why an envelope did not yield data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The backend answered `success: false`.
    #[error("request rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// `success: true` but no `data` where some was expected.
    #[error("response carried no data")]
    MissingData,
}

/// `{ success, data, message }` as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiFailure::Rejected`] when `success` is false and
    /// [`ApiFailure::MissingData`] when there is nothing in `data`.
    pub fn into_data(self) -> Result<T, ApiFailure> {
        if !self.success {
            return Err(ApiFailure::Rejected(self.message));
        }
        self.data.ok_or(ApiFailure::MissingData)
    }

    /// Like [`Self::into_data`] for endpoints where `data` is optional
    /// (deletes, logout).
    ///
    /// # Errors
    ///
    /// Returns [`ApiFailure::Rejected`] when `success` is false.
    pub fn into_optional(self) -> Result<Option<T>, ApiFailure> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiFailure::Rejected(self.message))
        }
    }
}

/// Pull a human-readable `message` out of an error body, if it has one.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|r| r.message)
        .filter(|m| !m.trim().is_empty())
}

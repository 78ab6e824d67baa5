//! Unified error handling for admin.
//!
//! Server faults are captured to Sentry before the error page is rendered.
//! An expired backend session sends the admin back to the login page.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::client::ApiError;
use thiserror::Error;

use crate::filters;
use crate::middleware::auth::LOGIN_PATH;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Api(ApiError::Rejected(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_server_fault(&self) -> bool {
        !matches!(
            self,
            Self::Api(ApiError::NotFound(_) | ApiError::Unauthorized | ApiError::Rejected(_))
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::BadRequest(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Api(ApiError::Unauthorized)) {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let (title, message) = match &self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => {
                ("Not found", "That record does not exist.".to_string())
            }
            Self::Api(ApiError::Rejected(reason)) => (
                "Request rejected",
                reason
                    .clone()
                    .unwrap_or_else(|| "The backend rejected the request.".to_string()),
            ),
            Self::Api(_) => (
                "Backend unavailable",
                "The backend API could not be reached.".to_string(),
            ),
            Self::Forbidden(reason) => ("Forbidden", reason.clone()),
            Self::BadRequest(reason) => ("Bad request", reason.clone()),
            Self::Session(_) | Self::Internal(_) => {
                ("Internal error", "Internal server error".to_string())
            }
        };

        let status = self.status();
        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message,
        };

        let body = page.render().unwrap_or_else(|e| {
            tracing::error!("Template render error: {}", e);
            "Internal Server Error".to_string()
        });

        (status, Html(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Api(ApiError::Rejected(None)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Api(ApiError::MissingData).status(),
            StatusCode::BAD_GATEWAY
        );
        assert!(!AppError::Forbidden("no".into()).is_server_fault());
        assert!(AppError::Internal("boom".into()).is_server_fault());
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }

    #[test]
    fn test_rejection_message_is_shown() {
        let response =
            AppError::Api(ApiError::Rejected(Some("Code already exists".into()))).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

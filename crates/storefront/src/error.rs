//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Full-page handlers return `Result<T, AppError>`
//! and failures render the error page with a "Try again" link. Fragment
//! handlers use [`inline_error`] instead so the rest of the page survives.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::client::ApiError;
use thiserror::Error;

use crate::filters;
use crate::middleware::auth::LOGIN_PATH;

/// Application-level error type for the storefront.
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

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
    /// Target of the "Try again" link. Empty renders `href=""`, which the
    /// browser resolves to the current URL.
    pub retry_href: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_server_fault(&self) -> bool {
        !matches!(
            self,
            Self::Api(ApiError::NotFound(_) | ApiError::Unauthorized)
                | Self::NotFound(_)
                | Self::BadRequest(_)
        )
    }

    /// Render the error page with a "Try again" link pointing at `retry_href`.
    ///
    /// Handlers pass the request's own path and query so retrying repeats the
    /// exact request that failed.
    pub fn into_response_with_retry(self, retry_href: impl Into<String>) -> Response {
        // Don't expose internal error details to clients
        let (title, message) = match &self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => (
                "Not found",
                "We couldn't find what you were looking for.".to_string(),
            ),
            Self::Api(_) => (
                "Store unavailable",
                "We couldn't reach the store just now.".to_string(),
            ),
            Self::BadRequest(reason) => ("Bad request", reason.clone()),
            Self::Session(_) | Self::Internal(_) => (
                "Something went wrong",
                "Something went wrong on our side.".to_string(),
            ),
        };

        // Backend session expired: sign in again
        if matches!(self, Self::Api(ApiError::Unauthorized)) {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message,
            retry_href: retry_href.into(),
        };

        (status, page).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with_retry(String::new())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Inline error snippet for HTMX fragments.
///
/// Answered with 200 so HTMX swaps it in where the fragment would have gone.
pub fn inline_error(message: &'static str) -> Response {
    Html(format!(
        "<p class=\"inline-error\" role=\"alert\">{message}</p>"
    ))
    .into_response()
}

/// Log a fragment-level failure and answer with an inline snippet.
pub fn fragment_failure(err: &ApiError, message: &'static str) -> Response {
    if err.is_unauthorized() {
        return (
            StatusCode::UNAUTHORIZED,
            [("HX-Redirect", LOGIN_PATH)],
        )
            .into_response();
    }
    tracing::error!(error = %err, "{message}");
    inline_error(message)
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
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
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::NotFound("/product/1".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status {
                status: 500,
                message: "boom".to_string()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Unauthorized)),
            StatusCode::SEE_OTHER
        );
    }

    #[tokio::test]
    async fn test_error_page_hides_details_and_offers_retry() {
        let err = AppError::Api(ApiError::Status {
            status: 500,
            message: "mongo exploded".to_string(),
        });
        let response = err.into_response_with_retry("/products?sort=name&page=2");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_text(response).await;
        assert!(!body.contains("mongo exploded"));
        assert!(body.contains("Try again"));
        assert!(body.contains("/products?sort=name"));
        assert!(body.contains("page=2"));
    }

    #[tokio::test]
    async fn test_plain_error_page_reloads_current_url() {
        let response = AppError::Api(ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_text(response).await;
        assert!(body.contains("<a class=\"button\" href=\"\">Try again</a>"));
    }

    #[tokio::test]
    async fn test_inline_error() {
        let response = inline_error("Could not update cart");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Could not update cart"));
    }
}

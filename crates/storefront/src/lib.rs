//! Cornershop Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. [`app`] assembles the complete
//! router with its middleware stack.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;

use std::time::Duration;

use axum::{
    Router, extract::State, http::StatusCode, middleware as axum_middleware, routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory holding CSS and other static assets.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront router with sessions, tracing and security headers.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the backend API answers before returning OK.
/// Returns 503 Service Unavailable if it does not.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::header::LOCATION;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    /// Router whose backend points at a closed port; only routes that never
    /// reach the backend behave normally.
    fn test_app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "CORNERSHOP_API_URL" => Some("http://127.0.0.1:9/api".to_string()),
            "CORNERSHOP_API_TIMEOUT_SECS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        app(AppState::new(config).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(!response.headers().contains_key("content-security-policy"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_readiness_fails_without_backend() {
        let response = test_app()
            .oneshot(get_request("/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cart_redirects_guests_to_login() {
        let response = test_app().oneshot(get_request("/cart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_htmx_fragment_gets_401_with_redirect() {
        let request = Request::builder()
            .uri("/cart/sidebar")
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["hx-redirect"], "/auth/login");
    }

    #[tokio::test]
    async fn test_guest_cart_count_is_zero() {
        let response = test_app().oneshot(get_request("/cart/count")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains('0'));
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app().oneshot(get_request("/auth/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_login_validates_before_calling_backend() {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("email=not-an-email&password="))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        // A backend call would have failed with 502
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Enter a valid email address"));
        assert!(body.contains("Password is required"));
    }

    #[tokio::test]
    async fn test_contact_validation() {
        let request = Request::builder()
            .method("POST")
            .uri("/contact")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=&email=a%40b.co&phone=abc&message="))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Name is required"));
        assert!(body.contains("Enter a valid phone number"));
        assert!(body.contains("Message is required"));
    }
}

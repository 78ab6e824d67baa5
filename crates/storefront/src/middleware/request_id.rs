//! Request ID middleware for request tracing and correlation.
//!
//! Each request gets an id that is recorded on the tracing span, tagged on
//! the Sentry scope and echoed back in the `x-request-id` response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id we are willing to echo.
const MAX_UPSTREAM_LEN: usize = 128;

/// Reuse an upstream proxy's id when it is short and printable, else mint a UUID v4.
fn resolve_request_id(upstream: Option<&str>) -> String {
    upstream
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_UPSTREAM_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_is_kept() {
        assert_eq!(resolve_request_id(Some("cf-1234")), "cf-1234");
    }

    #[test]
    fn test_unusable_upstream_id_is_replaced() {
        let long = "x".repeat(MAX_UPSTREAM_LEN + 1);
        for upstream in [None, Some(""), Some("has space"), Some(long.as_str())] {
            let id = resolve_request_id(upstream);
            assert!(Uuid::parse_str(&id).is_ok(), "{upstream:?} gave {id}");
        }
    }
}

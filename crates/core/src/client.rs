//! HTTP transport for the backend REST API.
//!
//! [`ApiClient`] is the one place requests are built. It sets the JSON
//! headers, forwards the signed-in user's backend cookie, maps status codes
//! onto [`ApiError`] and unwraps the `{ success, data, message }` envelope.
//! There is no retry and no de-duplication: each call is one round trip.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::api::{ApiFailure, ApiResponse, error_message};

const USER_AGENT: &str = concat!("cornershop/", env!("CARGO_PKG_VERSION"));

/// Errors from talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered 401 or 403.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend answered 404 for this path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-2xx answer.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The envelope said `success: false`.
    #[error("rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// The envelope had no `data` where some was expected.
    #[error("response carried no data")]
    MissingData,

    /// The body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL or a built path is not a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<ApiFailure> for ApiError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Rejected(message) => Self::Rejected(message),
            ApiFailure::MissingData => Self::MissingData,
        }
    }
}

impl ApiError {
    /// The backend's own explanation, fit to show next to a form.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(Some(message)) => Some(message.as_str()),
            Self::Status { status, message } if (400..500).contains(status) => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// The backend's session cookie, forwarded on the user's behalf.
///
/// Holds the `name=value` pairs from the login response's `Set-Cookie`
/// headers, joined the way a `Cookie` header expects.
#[derive(Clone)]
pub struct Credentials(SecretString);

impl Credentials {
    #[must_use]
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(SecretString::from(cookie.into()))
    }

    /// Collect `Set-Cookie` headers into a `Cookie` header value.
    ///
    /// Attributes (`Path`, `HttpOnly`, ...) are dropped. Returns `None` when
    /// no cookie was set.
    #[must_use]
    pub fn from_set_cookie(headers: &HeaderMap) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self::new(pairs.join("; ")))
        }
    }

    /// The raw `Cookie` header value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credentials([REDACTED])")
    }
}

/// Client for the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        url::Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// The base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<url::Url, ApiError> {
        let mut url = url::Url::parse(&format!("{}{path}", self.inner.base_url))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send one request and decode the envelope.
    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
        credentials: Option<&Credentials>,
    ) -> Result<(ApiResponse<T>, HeaderMap), ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(credentials) = credentials {
            request = request.header(COOKIE, credentials.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(path.to_owned())),
            s if !s.is_success() => {
                let message = error_message(&text).unwrap_or_else(|| {
                    s.canonical_reason().unwrap_or("request failed").to_owned()
                });
                tracing::debug!(status = %s, %message, "backend returned non-success status");
                return Err(ApiError::Status {
                    status: s.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let envelope = serde_json::from_str::<ApiResponse<T>>(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            ApiError::Parse(e)
        })?;

        Ok((envelope, headers))
    }

    /// `GET path`, returning `data`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; a missing `data` is [`ApiError::MissingData`].
    #[instrument(skip(self, credentials))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError> {
        self.get_with_query(path, &[], credentials).await
    }

    /// `GET path?query`, returning `data`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, credentials))]
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError> {
        let (envelope, _) = self
            .send::<(), T>(Method::GET, path, query, None, credentials)
            .await?;
        Ok(envelope.into_data()?)
    }

    /// `POST path` with a JSON body, returning `data`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, body, credentials))]
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (envelope, _) = self
            .send(Method::POST, path, &[], Some(body), credentials)
            .await?;
        Ok(envelope.into_data()?)
    }

    /// `PUT path` with a JSON body, returning `data`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, body, credentials))]
    pub async fn put<B, T>(
        &self,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (envelope, _) = self
            .send(Method::PUT, path, &[], Some(body), credentials)
            .await?;
        Ok(envelope.into_data()?)
    }

    /// `POST path` where the answer carries nothing we need.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] except [`ApiError::MissingData`].
    #[instrument(skip(self, body, credentials))]
    pub async fn post_unit<B>(
        &self,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let (envelope, _) = self
            .send::<B, serde_json::Value>(Method::POST, path, &[], Some(body), credentials)
            .await?;
        envelope.into_optional()?;
        Ok(())
    }

    /// `PUT path` where the answer carries nothing we need.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] except [`ApiError::MissingData`].
    #[instrument(skip(self, body, credentials))]
    pub async fn put_unit<B>(
        &self,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let (envelope, _) = self
            .send::<B, serde_json::Value>(Method::PUT, path, &[], Some(body), credentials)
            .await?;
        envelope.into_optional()?;
        Ok(())
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] except [`ApiError::MissingData`].
    #[instrument(skip(self, credentials))]
    pub async fn delete(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), ApiError> {
        let (envelope, _) = self
            .send::<(), serde_json::Value>(Method::DELETE, path, &[], None, credentials)
            .await?;
        envelope.into_optional()?;
        Ok(())
    }

    /// `POST path` and capture the session cookie the backend sets.
    ///
    /// Used for login and registration.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, body))]
    pub async fn post_for_credentials<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(T, Option<Credentials>), ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (envelope, headers) = self
            .send(Method::POST, path, &[], Some(body), None)
            .await?;
        let data = envelope.into_data()?;
        Ok((data, Credentials::from_set_cookie(&headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::response::{AppendHeaders, IntoResponse};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use reqwest::header::HeaderValue;
    use serde_json::{Value, json};

    use super::*;

    type Seen = Arc<Mutex<Vec<Option<String>>>>;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/api")
    }

    async fn backend(seen: Seen) -> String {
        let router = Router::new()
            .route(
                "/api/product",
                get(|State(seen): State<Seen>, headers: AxumHeaders| async move {
                    seen.lock().unwrap().push(
                        headers
                            .get("cookie")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_owned),
                    );
                    Json(json!({ "success": true, "data": [1, 2, 3] }))
                }),
            )
            .route(
                "/api/user/login",
                post(|| async {
                    (
                        AppendHeaders([
                            ("set-cookie", "token=abc123; Path=/; HttpOnly"),
                            ("set-cookie", "theme=dark"),
                        ]),
                        Json(json!({ "success": true, "data": { "name": "Ada" } })),
                    )
                        .into_response()
                }),
            )
            .route(
                "/api/private",
                get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({ "success": false }))) }),
            )
            .route(
                "/api/broken",
                get(|| async {
                    (
                        AxumStatus::UNPROCESSABLE_ENTITY,
                        Json(json!({ "success": false, "message": "Stock must be positive" })),
                    )
                }),
            )
            .route(
                "/api/declined",
                get(|| async { Json(json!({ "success": false, "message": "Coupon expired" })) }),
            )
            .route(
                "/api/empty",
                get(|| async { Json(json!({ "success": true })) }),
            )
            .route("/api/html", get(|| async { "<html>oops</html>" }))
            .with_state(seen);
        spawn(router).await
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_unwraps_data_and_forwards_cookie() {
        let seen = Seen::default();
        let api = client(&backend(seen.clone()).await);

        let anonymous: Vec<u32> = api.get("/product", None).await.unwrap();
        assert_eq!(anonymous, vec![1, 2, 3]);

        let credentials = Credentials::new("token=abc123");
        let _: Vec<u32> = api.get("/product", Some(&credentials)).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![None, Some("token=abc123".to_string())]);
    }

    #[tokio::test]
    async fn test_login_captures_set_cookie_pairs() {
        let api = client(&backend(Seen::default()).await);
        let (user, credentials): (Value, _) = api
            .post_for_credentials("/user/login", &json!({ "email": "a@b.co", "password": "x" }))
            .await
            .unwrap();
        assert_eq!(user["name"], "Ada");
        assert_eq!(credentials.unwrap().expose(), "token=abc123; theme=dark");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let api = client(&backend(Seen::default()).await);

        let err = api.get::<Value>("/private", None).await.unwrap_err();
        assert!(err.is_unauthorized());

        let err = api.get::<Value>("/missing", None).await.unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(p) if p == "/missing"));

        let err = api.get::<Value>("/broken", None).await.unwrap_err();
        assert!(matches!(&err, ApiError::Status { status: 422, .. }));
        assert_eq!(err.user_message(), Some("Stock must be positive"));

        let err = api.get::<Value>("/declined", None).await.unwrap_err();
        assert_eq!(err.user_message(), Some("Coupon expired"));

        let err = api.get::<Value>("/empty", None).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingData));

        let err = api.get::<Value>("/html", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_delete_accepts_missing_data() {
        let router = Router::new().route(
            "/api/category/c1",
            axum::routing::delete(|| async { Json(json!({ "success": true, "message": "Deleted" })) }),
        );
        let api = client(&spawn(router).await);
        api.delete("/category/c1", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Port 9 (discard) is not served locally.
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_millis(500)).unwrap();
        let err = api.get::<Value>("/product", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }

    #[test]
    fn test_credentials_from_set_cookie() {
        let mut headers = HeaderMap::new();
        assert!(Credentials::from_set_cookie(&headers).is_none());

        headers.append(SET_COOKIE, HeaderValue::from_static("sid=s%3Aabc.def; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("=broken"));
        let credentials = Credentials::from_set_cookie(&headers).unwrap();
        assert_eq!(credentials.expose(), "sid=s%3Aabc.def");
        assert_eq!(format!("{credentials:?}"), "Credentials([REDACTED])");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
    }
}

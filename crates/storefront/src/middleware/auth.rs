//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in shopper in route handlers.
//! A shopper is signed in when the session holds both the user snapshot and
//! the backend cookie captured at login.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::client::Credentials;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::routes::is_htmx;

/// Where unauthenticated shoppers are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// A signed-in shopper and the credentials to act for them.
#[derive(Debug, Clone)]
pub struct Shopper {
    pub user: CurrentUser,
    pub credentials: Credentials,
}

/// Extractor that requires a signed-in shopper.
///
/// Full-page requests are redirected to the login page. HTMX fragment
/// requests get a 401 with an `HX-Redirect` so the browser follows.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(shopper): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", shopper.user.name)
/// }
/// ```
pub struct RequireAuth(pub Shopper);

/// Error returned when authentication is required but the shopper is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [("HX-Redirect", HeaderValue::from_static(LOGIN_PATH))],
            )
                .into_response(),
        }
    }
}

async fn load_shopper(session: &Session) -> Option<Shopper> {
    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;
    let cookie: String = session
        .get(session_keys::BACKEND_COOKIE)
        .await
        .ok()
        .flatten()?;

    Some(Shopper {
        user,
        credentials: Credentials::new(cookie),
    })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let rejection = if is_htmx(&parts.headers) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        };

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(rejection);
        };

        load_shopper(session).await.map(Self).ok_or(rejection)
    }
}

/// Extractor that optionally gets the signed-in shopper.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<Shopper>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let shopper = match parts.extensions.get::<Session>() {
            Some(session) => load_shopper(session).await,
            None => None,
        };

        Ok(Self(shopper))
    }
}

/// Store the signed-in user and their backend cookie in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    user: &CurrentUser,
    credentials: &Credentials,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::BACKEND_COOKIE, credentials.expose())
        .await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

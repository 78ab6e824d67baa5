//! Authentication middleware and extractors for admin.
//!
//! Provides the extractor every admin route uses. An admin is signed in when
//! the session holds the backend user snapshot and the backend cookie, and
//! the user's role is `admin`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::client::Credentials;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// A signed-in admin and the credentials to act for them.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: CurrentAdmin,
    pub credentials: Credentials,
}

/// Extractor that requires admin authentication.
///
/// Visitors without a session are redirected to the login page. Signed-in
/// users without the `admin` role receive 403 Forbidden.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(session): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", session.admin.name)
/// }
/// ```
pub struct RequireAdmin(pub AdminSession);

/// Error returned when an admin is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Signed in, but not an admin.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only admins can access this resource",
            )
                .into_response(),
        }
    }
}

async fn load_admin(session: &Session) -> Option<AdminSession> {
    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()?;
    let cookie: String = session
        .get(session_keys::BACKEND_COOKIE)
        .await
        .ok()
        .flatten()?;

    Some(AdminSession {
        admin,
        credentials: Credentials::new(cookie),
    })
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        let signed_in = load_admin(session)
            .await
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        if !signed_in.admin.is_admin() {
            tracing::warn!(user_id = %signed_in.admin.id, "Non-admin session refused");
            return Err(AdminAuthRejection::Forbidden);
        }

        Ok(Self(signed_in))
    }
}

/// Store the admin and their backend cookie in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
    credentials: &Credentials,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await?;
    session
        .insert(session_keys::BACKEND_COOKIE, credentials.expose())
        .await
}

/// Clear the admin session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

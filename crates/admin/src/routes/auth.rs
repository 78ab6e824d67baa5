//! Authentication route handlers.
//!
//! Admins sign in with their backend account. The login only sticks when the
//! backend reports the `admin` role; any other account is turned away with
//! 403 and no session is stored.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::client::{ApiError, Credentials};
use cornershop_core::validation::{self, FieldErrors};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::render;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Shown when a valid non-admin account tries to sign in.
pub const NOT_AN_ADMIN: &str = "This account does not have admin access";

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl LoginTemplate {
    fn with_error(email: &str, error: impl Into<String>) -> Self {
        Self {
            email: email.to_string(),
            errors: FieldErrors::new(),
            error: Some(error.into()),
        }
    }
}

/// Display the login page. Signed-in admins go to the dashboard.
pub async fn login_page(session: Session) -> Response {
    let signed_in = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some_and(|admin| admin.is_admin());
    if signed_in {
        return Redirect::to("/").into_response();
    }

    render(&LoginTemplate {
        email: String::new(),
        errors: FieldErrors::new(),
        error: None,
    })
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    let email = validation::email(&mut errors, "email", &form.email);
    let password = validation::required(&mut errors, "password", "Password", &form.password);

    let (Some(email), Some(password)) = (email, password) else {
        return Ok(render(&LoginTemplate {
            email: form.email.clone(),
            errors,
            error: None,
        })
        .into_response());
    };

    let (user, credentials) = match state.api().login(email.as_str(), &password).await {
        Ok(ok) => ok,
        Err(
            e @ (ApiError::Unauthorized
            | ApiError::Rejected(_)
            | ApiError::Status {
                status: 400..=499, ..
            }),
        ) => {
            tracing::info!(error = %e, "Admin login refused");
            let message = e.user_message().unwrap_or("Invalid email or password");
            return Ok(render(&LoginTemplate::with_error(&form.email, message)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let admin = CurrentAdmin::from(&user);
    if !admin.is_admin() {
        tracing::warn!(user_id = %admin.id, "Non-admin account refused at login");
        if let Some(credentials) = credentials.as_ref() {
            end_backend_session(&state, credentials).await;
        }
        let page = render(&LoginTemplate::with_error(&form.email, NOT_AN_ADMIN));
        return Ok((StatusCode::FORBIDDEN, page).into_response());
    }

    let credentials: Credentials = credentials
        .ok_or_else(|| AppError::Internal("backend did not set a session cookie".to_string()))?;

    set_current_admin(&session, &admin, &credentials).await?;
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(user_id = %admin.id, "Admin signed in");

    Ok(Redirect::to("/").into_response())
}

async fn end_backend_session(state: &AppState, credentials: &Credentials) {
    if let Err(e) = state.api().logout(credentials).await {
        tracing::warn!(error = %e, "Backend logout failed");
    }
}

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    if let Some(cookie) = session
        .get::<String>(session_keys::BACKEND_COOKIE)
        .await
        .ok()
        .flatten()
    {
        end_backend_session(&state, &Credentials::new(cookie)).await;
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();
    tracing::info!("Admin signed out");

    Ok(Redirect::to(crate::middleware::auth::LOGIN_PATH))
}

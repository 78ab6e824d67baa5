//! Authentication route handlers.
//!
//! Login and registration are delegated to the backend. On success the
//! backend's session cookie is kept in our session and forwarded on later
//! calls for this shopper.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::client::{ApiError, Credentials};
use cornershop_core::models::User;
use cornershop_core::validation::{self, FieldErrors};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::NewAccount;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, sign_in, sign_out};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::Layout;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn refill(form: &RegisterForm, errors: FieldErrors, error: Option<String>) -> Self {
        Self {
            layout: Layout::default(),
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            errors,
            error,
        }
    }
}

/// Whether the backend turned the request down, as opposed to failing.
const fn is_refusal(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Unauthorized | ApiError::Rejected(_) | ApiError::Status { status: 400..=499, .. }
    )
}

/// Reason shown when the backend refuses a login or registration.
fn refusal_message(err: &ApiError, fallback: &str) -> String {
    err.user_message().unwrap_or(fallback).to_string()
}

/// Store the backend session and greet the shopper.
async fn establish(
    session: &Session,
    user: &User,
    credentials: Option<Credentials>,
) -> Result<Response, AppError> {
    let credentials = credentials
        .ok_or_else(|| AppError::Internal("backend did not set a session cookie".to_string()))?;
    let current = CurrentUser::from(user);

    sign_in(session, &current, &credentials).await?;
    set_sentry_user(&current.id, Some(&current.email));
    tracing::info!(user_id = %current.id, "Shopper signed in");

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in shoppers go home.
pub async fn login_page(OptionalAuth(shopper): OptionalAuth) -> Response {
    if shopper.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout: Layout::default(),
        email: String::new(),
        errors: FieldErrors::new(),
        error: None,
    }
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

    let (Some(email), Some(_)) = (email, password) else {
        return Ok(LoginTemplate {
            layout: Layout::default(),
            email: form.email.clone(),
            errors,
            error: None,
        }
        .into_response());
    };

    match state.api().login(email.as_str(), &form.password).await {
        Ok((user, credentials)) => establish(&session, &user, credentials).await,
        Err(e) if is_refusal(&e) => {
            tracing::warn!(error = %e, "Login refused");
            Ok(LoginTemplate {
                layout: Layout::default(),
                email: form.email.clone(),
                errors,
                error: Some(refusal_message(&e, "Invalid email or password")),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(shopper): OptionalAuth) -> Response {
    if shopper.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate::refill(&RegisterForm::default(), FieldErrors::new(), None).into_response()
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    let name = validation::required(&mut errors, "name", "Name", &form.name);
    let email = validation::email(&mut errors, "email", &form.email);
    let phone = validation::phone(&mut errors, "phone", &form.phone);
    let password = validation::length(
        &mut errors,
        "password",
        "Password",
        &form.password,
        MIN_PASSWORD_LEN,
        128,
    );
    if form.password != form.password_confirm {
        errors.add("password_confirm", "Passwords do not match");
    }

    let (Some(name), Some(email), Some(_), true) = (name, email, password, errors.is_empty())
    else {
        return Ok(RegisterTemplate::refill(&form, errors, None).into_response());
    };

    let account = NewAccount {
        name: &name,
        email: email.as_str(),
        phone: phone.as_deref(),
        password: &form.password,
    };

    match state.api().register(&account).await {
        Ok((user, credentials)) => establish(&session, &user, credentials).await,
        Err(e) if is_refusal(&e) => {
            tracing::warn!(error = %e, "Registration refused");
            let message = refusal_message(&e, "Registration failed");
            Ok(RegisterTemplate::refill(&form, FieldErrors::new(), Some(message)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Log out of the backend and drop the session.
#[instrument(skip(state, session, shopper))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(shopper): OptionalAuth,
) -> Result<Redirect, AppError> {
    if let Some(shopper) = shopper {
        // Our session goes regardless of what the backend says
        if let Err(e) = state.api().logout(&shopper.credentials).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    sign_out(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

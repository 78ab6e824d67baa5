//! Contact form route handlers.
//!
//! Messages are validated here and posted to the backend's `/contact`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use cornershop_core::validation::{self, FieldErrors};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::ContactMessage;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::Layout;

/// Longest message accepted.
const MAX_MESSAGE_LEN: usize = 2000;

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub sent: bool,
}

/// Display the contact form, prefilled for signed-in shoppers.
pub async fn show(OptionalAuth(shopper): OptionalAuth) -> impl IntoResponse {
    let form = shopper.as_ref().map_or_else(ContactForm::default, |s| ContactForm {
        name: s.user.name.clone(),
        email: s.user.email.clone(),
        ..ContactForm::default()
    });

    ContactTemplate {
        layout: Layout::new(shopper.as_ref()),
        form,
        errors: FieldErrors::new(),
        sent: false,
    }
}

/// Handle contact form submission.
#[instrument(skip(state, shopper, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(shopper): OptionalAuth,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let layout = Layout::new(shopper.as_ref());

    let mut errors = FieldErrors::new();
    let name = validation::required(&mut errors, "name", "Name", &form.name);
    let email = validation::email(&mut errors, "email", &form.email);
    let phone = validation::phone(&mut errors, "phone", &form.phone);
    let message = validation::length(
        &mut errors,
        "message",
        "Message",
        &form.message,
        1,
        MAX_MESSAGE_LEN,
    );

    let (Some(name), Some(email), Some(message), true) =
        (name, email, message, errors.is_empty())
    else {
        return Ok(ContactTemplate {
            layout,
            form,
            errors,
            sent: false,
        }
        .into_response());
    };

    state
        .api()
        .contact(&ContactMessage {
            name: &name,
            email: email.as_str(),
            phone: phone.as_deref(),
            message: &message,
        })
        .await?;

    tracing::info!("Contact message sent");

    Ok(ContactTemplate {
        layout,
        form: ContactForm::default(),
        errors: FieldErrors::new(),
        sent: true,
    }
    .into_response())
}

//! Offer management route handlers.
//!
//! Offers are the banner messages the storefront shows while they are live.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use cornershop_core::OfferId;
use cornershop_core::models::Offer;
use cornershop_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::forms::OfferForm;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::state::AppState;

const CURRENT_PATH: &str = "/offers";

/// Offer row in the listing.
#[derive(Debug, Clone)]
pub struct OfferView {
    pub id: String,
    pub title: String,
    pub message: String,
    pub discount: String,
    pub window: String,
    pub status: &'static str,
    pub status_class: &'static str,
}

impl OfferView {
    fn new(offer: &Offer, now: DateTime<Utc>) -> Self {
        let (status, status_class) = if !offer.is_active {
            ("Inactive", "badge badge-muted")
        } else if now < offer.start_date {
            ("Scheduled", "badge badge-info")
        } else if now > offer.end_date {
            ("Ended", "badge badge-muted")
        } else {
            ("Live", "badge badge-success")
        };

        Self {
            id: offer.id.to_string(),
            title: offer.title.clone(),
            message: offer.message.clone(),
            discount: format!("{}%", offer.discount_percentage.normalize()),
            window: format!(
                "{} – {}",
                offer.start_date.format("%b %-d, %Y"),
                offer.end_date.format("%b %-d, %Y")
            ),
            status,
            status_class,
        }
    }
}

/// Offers list page template.
#[derive(Template)]
#[template(path = "offers/index.html")]
pub struct OffersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub offers: Vec<OfferView>,
}

/// Offer create/edit form template.
#[derive(Template)]
#[template(path = "offers/form.html")]
pub struct OfferFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: OfferForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl OfferFormTemplate {
    fn new(
        admin: &AdminSession,
        target: Option<&OfferId>,
        form: OfferForm,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        let (heading, action) = target.map_or_else(
            || ("New offer".to_string(), CURRENT_PATH.to_string()),
            |id| ("Edit offer".to_string(), format!("{CURRENT_PATH}/{id}")),
        );
        Self {
            admin_user: AdminUserView::from(&admin.admin),
            current_path: CURRENT_PATH.to_string(),
            heading,
            action,
            form,
            errors,
            error,
        }
    }
}

/// Offers list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let offers = state.api().list::<Offer>(&admin.credentials).await?;
    let now = Utc::now();

    let template = OffersIndexTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: CURRENT_PATH.to_string(),
        flash: take_flash(&session).await,
        offers: offers.iter().map(|o| OfferView::new(o, now)).collect(),
    };

    Ok(render(&template))
}

/// New offer form handler.
#[instrument(skip(admin))]
pub async fn new_offer(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&OfferFormTemplate::new(
        &admin,
        None,
        OfferForm::blank(),
        FieldErrors::new(),
        None,
    ))
}

/// Create offer handler.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OfferForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&OfferFormTemplate::new(&admin, None, form, errors, None)).into_response(),
            );
        }
    };

    match state
        .api()
        .create::<Offer, _>(&input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Offer created").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&OfferFormTemplate::new(
                &admin,
                None,
                form,
                FieldErrors::new(),
                Some(reason),
            ))
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Edit offer form handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OfferId>,
) -> Result<Html<String>, AppError> {
    let offer = state
        .api()
        .fetch::<Offer>(&id, &admin.credentials)
        .await?;

    Ok(render(&OfferFormTemplate::new(
        &admin,
        Some(&id),
        OfferForm::from(&offer),
        FieldErrors::new(),
        None,
    )))
}

/// Update offer handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
    Form(form): Form<OfferForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&OfferFormTemplate::new(&admin, Some(&id), form, errors, None))
                    .into_response(),
            );
        }
    };

    match state
        .api()
        .update::<Offer, _>(&id, &input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Offer updated").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&OfferFormTemplate::new(
                &admin,
                Some(&id),
                form,
                FieldErrors::new(),
                Some(reason),
            ))
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Delete offer handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
) -> Result<Redirect, AppError> {
    state
        .api()
        .delete::<Offer>(&id, &admin.credentials)
        .await?;
    set_flash(&session, "Offer deleted").await;
    Ok(Redirect::to(CURRENT_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_offer_status_follows_window() {
        let offer = Offer {
            id: OfferId::new("o1"),
            title: "Sale".to_string(),
            message: "Everything 20% off".to_string(),
            discount_percentage: dec!(20.0),
            start_date: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap(),
            is_active: true,
        };

        let before = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(OfferView::new(&offer, before).status, "Scheduled");
        assert_eq!(OfferView::new(&offer, during).status, "Live");
        assert_eq!(OfferView::new(&offer, after).status, "Ended");
        assert_eq!(OfferView::new(&offer, during).discount, "20%");
    }
}

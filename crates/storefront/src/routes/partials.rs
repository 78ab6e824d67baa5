//! Shared fragments loaded into the page layout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use cornershop_core::models::Offer;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::state::AppState;

/// One offer line in the banner.
#[derive(Clone)]
pub struct OfferView {
    pub title: String,
    pub message: String,
    pub percent: Option<String>,
}

impl From<&Offer> for OfferView {
    fn from(offer: &Offer) -> Self {
        Self {
            title: offer.title.clone(),
            message: offer.message.clone(),
            percent: (offer.discount_percentage > Decimal::ZERO)
                .then(|| format!("{}% off", offer.discount_percentage.normalize())),
        }
    }
}

/// Offer banner fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/offers.html")]
pub struct OffersTemplate {
    pub offers: Vec<OfferView>,
}

/// Offer banner, from the local offer cache.
///
/// A failure hides the banner rather than breaking the page.
#[instrument(skip(state))]
pub async fn offers(State(state): State<AppState>) -> Response {
    match state.api().offers().await {
        Ok(offers) => {
            let now = Utc::now();
            OffersTemplate {
                offers: offers
                    .iter()
                    .filter(|o| o.is_live(now))
                    .map(OfferView::from)
                    .collect(),
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load offers");
            Html("").into_response()
        }
    }
}

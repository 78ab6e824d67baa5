//! Wishlist route handlers.
//!
//! The heart button is a self-refreshing fragment: it polls
//! `/wishlist/status/{id}` on a fixed interval so a change made in another
//! tab shows up without a reload.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::ProductId;
use cornershop_core::client::ApiError;
use cornershop_core::wishlist::Toggle;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, fragment_failure};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::routes::is_htmx;
use crate::state::AppState;
use crate::views::{Layout, ProductCardView};

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: ProductId,
    /// Set on the wishlist page, where removing drops the whole card.
    #[serde(default)]
    pub remove_card: bool,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: String,
    pub in_wishlist: bool,
    pub poll_secs: u64,
}

impl WishlistButtonTemplate {
    fn new(state: &AppState, product_id: &ProductId, in_wishlist: bool) -> Self {
        Self {
            product_id: product_id.to_string(),
            in_wishlist,
            poll_secs: state.config().shop.wishlist_poll_secs,
        }
    }
}

/// Display wishlist page.
#[instrument(skip(state, shopper))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let wishlist = state
        .api()
        .wishlist(&shopper.user.id, &shopper.credentials)
        .await?;

    Ok(WishlistTemplate {
        layout: Layout::new(Some(&shopper)),
        products: ProductCardView::list(&wishlist.products, state.currency()),
    })
}

/// Add or remove a product depending on current membership.
#[instrument(skip(state, shopper, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Response {
    let api = state.api();
    let user_id = &shopper.user.id;

    let result = async {
        let wishlist = api.wishlist(user_id, &shopper.credentials).await?;
        let action = wishlist.toggle_action(&form.product_id);
        match action {
            Toggle::Add => {
                api.add_to_wishlist(user_id, &form.product_id, &shopper.credentials)
                    .await?;
            }
            Toggle::Remove => {
                api.remove_from_wishlist(user_id, &form.product_id, &shopper.credentials)
                    .await?;
            }
        }
        Ok::<_, ApiError>(action)
    }
    .await;

    let action = match result {
        Ok(action) => action,
        Err(e) if is_htmx(&headers) => return fragment_failure(&e, "Could not update wishlist"),
        Err(e) => return AppError::Api(e).into_response(),
    };

    if !is_htmx(&headers) {
        return Redirect::to("/wishlist").into_response();
    }
    if form.remove_card && action == Toggle::Remove {
        return Html("").into_response();
    }

    WishlistButtonTemplate::new(&state, &form.product_id, action == Toggle::Add).into_response()
}

/// Heart button for one product, polled by the page.
#[instrument(skip(state, shopper))]
pub async fn status(
    State(state): State<AppState>,
    OptionalAuth(shopper): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Response {
    let in_wishlist = match shopper {
        Some(shopper) => match state
            .api()
            .wishlist(&shopper.user.id, &shopper.credentials)
            .await
        {
            Ok(wishlist) => wishlist.contains(&product_id),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch wishlist status");
                false
            }
        },
        None => false,
    };

    WishlistButtonTemplate::new(&state, &product_id, in_wishlist).into_response()
}

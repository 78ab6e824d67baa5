//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives on the backend, keyed by user. Every mutation is
//! followed by a fresh fetch so the page shows what the backend holds.
//! Plain form posts (no HTMX) are answered with a redirect to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use cornershop_core::ProductId;
use cornershop_core::cart::{CartSummary, Decrement, decrement};
use cornershop_core::client::ApiError;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb, fragment_failure};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, Shopper};
use crate::routes::is_htmx;
use crate::state::AppState;
use crate::views::{CartView, Layout};

/// Which fragment the caller is showing the cart in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartTarget {
    /// The line list on `/cart`.
    #[default]
    Page,
    /// The slide-out sidebar.
    Sidebar,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Form data for increment, decrement and remove.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub target: CartTarget,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_sidebar.html")]
pub struct CartSidebarTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Fetch and group the shopper's cart.
async fn load_summary(state: &AppState, shopper: &Shopper) -> Result<CartSummary, ApiError> {
    let cart = state
        .api()
        .cart(&shopper.user.id, &shopper.credentials)
        .await?;
    Ok(CartSummary::from(&cart))
}

/// Answer a mutation with the fresh cart in the fragment the caller shows.
async fn respond_with_cart(
    state: &AppState,
    shopper: &Shopper,
    headers: &HeaderMap,
    target: CartTarget,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    let summary = match load_summary(state, shopper).await {
        Ok(summary) => summary,
        Err(e) => return fragment_failure(&e, "Could not load your cart"),
    };
    let cart = CartView::new(&summary, state.currency());
    let trigger = AppendHeaders([("HX-Trigger", "cart-updated")]);

    match target {
        CartTarget::Page => (trigger, CartItemsTemplate { cart }).into_response(),
        CartTarget::Sidebar => (trigger, CartSidebarTemplate { cart }).into_response(),
    }
}

fn mutation_failed(headers: &HeaderMap, err: ApiError) -> Response {
    if is_htmx(headers) {
        fragment_failure(&err, "Could not update your cart")
    } else {
        AppError::from(err).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let summary = load_summary(&state, &shopper).await?;

    Ok(CartShowTemplate {
        layout: Layout::new(Some(&shopper)),
        cart: CartView::new(&summary, state.currency()),
    })
}

/// Cart sidebar fragment (HTMX).
#[instrument(skip(state, shopper))]
pub async fn sidebar(State(state): State<AppState>, RequireAuth(shopper): RequireAuth) -> Response {
    match load_summary(&state, &shopper).await {
        Ok(summary) => CartSidebarTemplate {
            cart: CartView::new(&summary, state.currency()),
        }
        .into_response(),
        Err(e) => fragment_failure(&e, "Could not load your cart"),
    }
}

/// Get cart count badge (HTMX). Guests always see zero.
#[instrument(skip(state, shopper))]
pub async fn count(State(state): State<AppState>, OptionalAuth(shopper): OptionalAuth) -> Response {
    let count = match shopper {
        Some(shopper) => match load_summary(&state, &shopper).await {
            Ok(summary) => summary.item_count,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch cart count");
                0
            }
        },
        None => 0,
    };

    CartCountTemplate { count }.into_response()
}

/// Add item to cart.
///
/// Returns the sidebar so the shopper sees what was added, and triggers
/// `cart-updated` to refresh the badge.
#[instrument(skip(state, shopper, headers))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);

    let result = async {
        let product = state.api().product(&form.product_id).await?;
        state
            .api()
            .add_to_cart(&shopper.user.id, &product, quantity, &shopper.credentials)
            .await
    }
    .await;

    if let Err(e) = result {
        return mutation_failed(&headers, e);
    }

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    respond_with_cart(&state, &shopper, &headers, CartTarget::Sidebar).await
}

/// Raise a grouped line's quantity by one.
#[instrument(skip(state, shopper, headers))]
pub async fn increment(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    let result = async {
        let current = load_summary(&state, &shopper)
            .await?
            .quantity_of(&form.product_id);

        if current == 0 {
            let product = state.api().product(&form.product_id).await?;
            state
                .api()
                .add_to_cart(&shopper.user.id, &product, 1, &shopper.credentials)
                .await
        } else {
            state
                .api()
                .set_quantity(
                    &shopper.user.id,
                    &form.product_id,
                    current.saturating_add(1),
                    &shopper.credentials,
                )
                .await
        }
    }
    .await;

    match result {
        Ok(()) => respond_with_cart(&state, &shopper, &headers, form.target).await,
        Err(e) => mutation_failed(&headers, e),
    }
}

/// Lower a grouped line's quantity by one, removing it at one.
#[instrument(skip(state, shopper, headers))]
pub async fn decrement_line(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    let result = async {
        let current = load_summary(&state, &shopper)
            .await?
            .quantity_of(&form.product_id);
        let api = state.api();

        match decrement(current) {
            Decrement::SetQuantity(quantity) => {
                api.set_quantity(
                    &shopper.user.id,
                    &form.product_id,
                    quantity,
                    &shopper.credentials,
                )
                .await
            }
            Decrement::Remove if current == 0 => Ok(()),
            Decrement::Remove => {
                api.remove_from_cart(&shopper.user.id, &form.product_id, &shopper.credentials)
                    .await
            }
        }
    }
    .await;

    match result {
        Ok(()) => respond_with_cart(&state, &shopper, &headers, form.target).await,
        Err(e) => mutation_failed(&headers, e),
    }
}

/// Remove item from cart.
#[instrument(skip(state, shopper, headers))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    match state
        .api()
        .remove_from_cart(&shopper.user.id, &form.product_id, &shopper.credentials)
        .await
    {
        Ok(()) => respond_with_cart(&state, &shopper, &headers, form.target).await,
        Err(e) => mutation_failed(&headers, e),
    }
}

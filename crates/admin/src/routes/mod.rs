//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Dashboard
//! GET  /                             - Counts, revenue, recent orders
//!
//! # Auth (backend accounts with the admin role)
//! GET  /auth/login                   - Login page
//! POST /auth/login                   - Login action
//! POST /auth/logout                  - Logout action
//!
//! # Catalog & promotions (same CRUD shape each)
//! GET  /products                     - Listing
//! GET  /products/new                 - Create form
//! POST /products                     - Create
//! GET  /products/{id}/edit           - Edit form
//! POST /products/{id}                - Update
//! POST /products/{id}/delete         - Delete
//! ...  /categories, /coupons, /offers
//!
//! # Orders
//! GET  /orders                       - Filtered, paginated table
//! GET  /orders/{id}                  - Detail with shipping form
//! POST /orders/{id}/shipping         - Update shipping
//! GET  /orders/{id}/print            - Printable order document
//! ```

pub mod auth;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod offers;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Signed-in admin shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

/// Render a template, logging on failure.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Queue a one-shot notice for the next page.
pub async fn set_flash(session: &Session, message: &str) {
    if let Err(e) = session.insert(session_keys::FLASH, message).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        })
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_product))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new_category))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index).post(coupons::create))
        .route("/new", get(coupons::new_coupon))
        .route("/{id}", post(coupons::update))
        .route("/{id}/edit", get(coupons::edit))
        .route("/{id}/delete", post(coupons::delete))
}

/// Create the offer routes router.
pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(offers::index).post(offers::create))
        .route("/new", get(offers::new_offer))
        .route("/{id}", post(offers::update))
        .route("/{id}/edit", get(offers::edit))
        .route("/{id}/delete", post(offers::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/shipping", post(orders::update_shipping))
        .route("/{id}/print", get(orders::print))
}

/// Build the complete admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/coupons", coupon_routes())
        .nest("/offers", offer_routes())
        .nest("/orders", order_routes())
}

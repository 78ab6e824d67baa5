//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Products
//! GET  /products               - Product listing (search, category, price, sort, page)
//! GET  /products/{id}          - Product detail
//! POST /products/{id}/rating   - Submit rating
//!
//! # Fragments (HTMX)
//! GET  /partials/offers        - Offer banner
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! GET  /cart/sidebar           - Cart sidebar fragment
//! GET  /cart/count             - Cart count badge (zero for guests)
//! POST /cart/add               - Add to cart (returns sidebar, triggers cart-updated)
//! POST /cart/increment         - Quantity +1
//! POST /cart/decrement         - Quantity -1, removes at 1
//! POST /cart/remove            - Remove line
//!
//! # Wishlist (requires auth)
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Add or remove
//! GET  /wishlist/status/{id}   - Heart button fragment (polled)
//!
//! # Checkout & orders (requires auth)
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place order
//! POST /checkout/coupon        - Price a coupon (totals fragment)
//! GET  /orders                 - Order history
//! GET  /orders/{id}            - Order detail with shipping tracker
//!
//! # Contact
//! GET  /contact                - Contact form
//! POST /contact                - Send message
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod orders;
pub mod partials;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::state::AppState;

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/rating", post(products::rate))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/sidebar", get(cart::sidebar))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement_line))
        .route("/remove", post(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/toggle", post(wishlist::toggle))
        .route("/status/{id}", get(wishlist::status))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Shared fragments
        .route("/partials/offers", get(partials::offers))
        // Cart routes
        .nest("/cart", cart_routes())
        // Wishlist routes
        .nest("/wishlist", wishlist_routes())
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::place))
        .route("/checkout/coupon", post(checkout::apply_coupon))
        // Order history
        .nest("/orders", order_routes())
        // Contact form
        .route("/contact", get(contact::show).post(contact::submit))
        // Auth routes
        .nest("/auth", auth_routes())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}

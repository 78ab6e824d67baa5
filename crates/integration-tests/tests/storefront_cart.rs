//! Cart flows through the storefront against the mock backend.

#![allow(clippy::unwrap_used)]

use cornershop_integration_tests::{
    MockBackend, PASSWORD, SHOPPER_EMAIL, browser, start_storefront,
};
use reqwest::{Client, StatusCode};

async fn sign_in(client: &Client, base: &str) {
    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
}

async fn add(client: &Client, base: &str, product_id: &str) {
    let response = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", product_id)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/cart");
}

async fn cart_page(client: &Client, base: &str) -> String {
    let response = client.get(format!("{base}/cart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await.unwrap()
}

#[tokio::test]
async fn test_guest_cart_redirects_to_login() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;

    let response = browser().get(format!("{base}/cart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/auth/login");
    assert!(backend.requests_to("GET", "/api/cart/u1").is_empty());
}

#[tokio::test]
async fn test_adding_same_product_twice_shows_one_line() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;

    add(&client, &base, "p1").await;
    add(&client, &base, "p1").await;

    // The backend keeps one raw line per add
    assert_eq!(backend.cart_lines("u1"), 2);

    let body = cart_page(&client, &base).await;
    assert_eq!(body.matches("id=\"cart-line-p1\"").count(), 1);
    assert!(body.contains("<span>2</span>"));
    assert!(body.contains("$25.00"));
}

#[tokio::test]
async fn test_decrementing_last_unit_empties_cart() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;
    add(&client, &base, "p1").await;

    let response = client
        .post(format!("{base}/cart/decrement"))
        .form(&[("product_id", "p1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(backend.requests_to("DELETE", "/api/cart/u1/p1").len(), 1);
    let body = cart_page(&client, &base).await;
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_backend_cookie_is_forwarded() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;

    cart_page(&client, &base).await;

    let fetches = backend.requests_to("GET", "/api/cart/u1");
    assert!(!fetches.is_empty());
    for fetch in fetches {
        assert_eq!(fetch.cookie.as_deref(), Some("token=tok-u1"));
    }
}

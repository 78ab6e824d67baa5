//! Admin sign-in against the mock backend.

#![allow(clippy::unwrap_used)]

use cornershop_integration_tests::{
    ADMIN_EMAIL, MockBackend, PASSWORD, SHOPPER_EMAIL, browser, start_admin,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_non_admin_account_is_refused() {
    let backend = MockBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response.text().await.unwrap();
    assert!(body.contains("This account does not have admin access"));

    // The backend session opened by the login is closed again
    let logouts = backend.requests_to("POST", "/api/user/logout");
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].cookie.as_deref(), Some("token=tok-u1"));

    // Nothing was stored in the admin session
    let response = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/auth/login");
}

#[tokio::test]
async fn test_wrong_password_shows_message() {
    let backend = MockBackend::start().await;
    let base = start_admin(&backend).await;

    let response = browser()
        .post(format!("{base}/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", "nope")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_admin_reaches_dashboard_with_forwarded_cookie() {
    let backend = MockBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");

    let response = client.get(format!("{base}/orders")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("No orders yet"));

    let fetches = backend.requests_to("GET", "/api/order");
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].cookie.as_deref(), Some("token=tok-a1"));
}

//! Admin category management against the mock backend.

#![allow(clippy::unwrap_used)]

use cornershop_integration_tests::{ADMIN_EMAIL, MockBackend, PASSWORD, browser, start_admin};
use reqwest::{Client, StatusCode};

async fn admin_session(backend: &MockBackend) -> (Client, String) {
    let base = start_admin(backend).await;
    let client = browser();
    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    (client, base)
}

#[tokio::test]
async fn test_blank_category_name_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let (client, base) = admin_session(&backend).await;

    let response = client
        .post(format!("{base}/categories"))
        .form(&[("name", "  "), ("description", "Leaves"), ("image", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Name is required"));
    assert!(body.contains("Leaves"));

    assert!(backend.requests_to("POST", "/api/category").is_empty());
}

#[tokio::test]
async fn test_created_category_is_listed_with_flash() {
    let backend = MockBackend::start().await;
    let (client, base) = admin_session(&backend).await;

    let response = client
        .post(format!("{base}/categories"))
        .form(&[("name", "Teaware"), ("description", ""), ("image", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/categories");

    let creates = backend.requests_to("POST", "/api/category");
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].cookie.as_deref(), Some("token=tok-a1"));

    let body = client
        .get(format!("{base}/categories"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Category created"));
    assert!(body.contains("Teaware"));
}

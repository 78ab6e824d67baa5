//! Catalog browsing through the storefront against the mock backend.

#![allow(clippy::unwrap_used)]

use cornershop_integration_tests::{MockBackend, browser, start_storefront, unescape};
use reqwest::StatusCode;

#[tokio::test]
async fn test_price_range_survives_the_round_trip() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;

    // Bounds arrive inverted and come back in order
    let response = browser()
        .get(format!("{base}/products?min_price=20&max_price=5"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();

    assert!(body.contains("name=\"min_price\" value=\"5\""));
    assert!(body.contains("name=\"max_price\" value=\"20\""));
    assert!(body.contains("Green tea"));
    assert!(!body.contains("Ceramic mug"));
}

#[tokio::test]
async fn test_failed_listing_offers_retry_of_same_request() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    backend.set_failing(true);

    let response = browser()
        .get(format!("{base}/products?min_price=10&sort=price_asc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = unescape(&response.text().await.unwrap());
    assert!(body.contains("Try again"));
    assert!(body.contains("href=\"/products?min_price=10&sort=price_asc\""));
    assert!(!body.contains("database unavailable"));
}

#[tokio::test]
async fn test_failed_product_page_offers_retry() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    backend.set_failing(true);

    let response = browser()
        .get(format!("{base}/products/p1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.text().await.unwrap();
    assert!(body.contains("Try again"));
    assert!(!body.contains("database unavailable"));
}

#[tokio::test]
async fn test_product_id_stays_inside_its_path_segment() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;

    let response = browser()
        .get(format!("{base}/products/..%2Fcategory"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        backend
            .requests_to("GET", "/api/product/..%2Fcategory")
            .len(),
        1
    );
    assert!(backend.requests_to("GET", "/api/category").is_empty());
}

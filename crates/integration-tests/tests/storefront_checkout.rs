//! Checkout through the storefront against the mock backend.

#![allow(clippy::unwrap_used)]

use cornershop_integration_tests::{
    MockBackend, PASSWORD, SHOPPER_EMAIL, browser, start_storefront,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_invalid_checkout_keeps_coupon_in_totals() {
    let backend = MockBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "p1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Address left blank, coupon valid
    let response = client
        .post(format!("{base}/checkout"))
        .form(&[("payment_method", "cod"), ("coupon_code", "save10")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(body.contains("Full name is required"));
    assert!(body.contains("Discount (SAVE10)"));
    assert!(body.contains("$1.25"));
    assert!(body.contains("$11.25"));

    assert_eq!(backend.requests_to("POST", "/api/coupon/validate").len(), 1);
    assert!(backend.requests_to("POST", "/api/order").is_empty());
}

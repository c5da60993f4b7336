//! Router behavior that needs no database.
//!
//! Every request here is rejected or answered before a query would run.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use ampere_integration_tests::{empty_request, json_body, json_request, offline_app, send};

#[tokio::test]
async fn test_health_is_ok() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/health/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_api_responses_carry_security_headers() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/api/cart")).await;

    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_echoed_when_acceptable() {
    let app = offline_app();

    let mut request = empty_request("GET", "/health");
    request
        .headers_mut()
        .insert("x-request-id", "edge-7f3a.42".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a.42");

    let mut request = empty_request("GET", "/health");
    request
        .headers_mut()
        .insert("x-request-id", "bad id with spaces".parse().unwrap());
    let response = send(&app, request).await;
    assert_ne!(response.headers()["x-request-id"], "bad id with spaces");
}

#[tokio::test]
async fn test_admin_routes_reject_anonymous_requests() {
    let app = offline_app();

    let requests = [
        empty_request("GET", "/api/admin/stats"),
        empty_request("GET", "/api/admin/categories"),
        empty_request("GET", "/api/admin/orders"),
        empty_request("GET", "/api/admin/users"),
        empty_request("DELETE", "/api/admin/categories/1"),
        empty_request("POST", "/api/admin/catalog/invalidate"),
        json_request("POST", "/api/admin/categories", &json!({ "name": "Drones" })),
        json_request("PATCH", "/api/admin/orders/1/status", &json!({ "status": "SHIPPED" })),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let body = json_body(response).await;
        assert_eq!(body["error"], "Authentication required", "{uri}");
    }
}

#[tokio::test]
async fn test_favorites_and_profile_require_sign_in() {
    let app = offline_app();

    for request in [
        empty_request("GET", "/api/favorites"),
        empty_request("POST", "/api/favorites/3"),
        empty_request("GET", "/api/orders"),
        empty_request("GET", "/api/auth/me"),
    ] {
        let uri = request.uri().clone();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_empty_cart_needs_no_database() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/api/cart")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_quantity"], 0);
}

#[tokio::test]
async fn test_checkout_validation_errors_are_keyed_by_path() {
    let app = offline_app();
    let body = json!({
        "customer": {
            "name": "Irina Volkova",
            "email": "irina-at-example.com",
            "phone": "+7 912 555-01-23",
            "address": "Lenina 12, apt 4, Yekaterinburg"
        },
        "payment_method": "CASH_ON_DELIVERY"
    });

    let response = send(&app, json_request("POST", "/api/orders", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"]["customer.email"].is_array());
}

#[tokio::test]
async fn test_checkout_of_empty_cart_is_rejected() {
    let app = offline_app();
    let body = json!({
        "customer": {
            "name": "Irina Volkova",
            "email": "irina@example.com",
            "phone": "+7 912 555-01-23",
            "address": "Lenina 12, apt 4, Yekaterinburg"
        },
        "payment_method": "CARD_ON_DELIVERY"
    });

    let response = send(&app, json_request("POST", "/api/orders", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "cart is empty");
}

#[tokio::test]
async fn test_malformed_json_is_reported() {
    let app = offline_app();
    let mut request = json_request("POST", "/api/orders", &json!({}));
    *request.body_mut() = axum::body::Body::from("{\"customer\":");

    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_weak_password_is_rejected_before_storage() {
    let app = offline_app();
    let body = json!({ "email": "pavel@example.com", "password": "short" });

    let response = send(&app, json_request("POST", "/api/auth/register", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oauth_login_is_not_found_when_unconfigured() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/api/auth/oauth/login")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upstream_outage_falls_back_to_mock_data() {
    let app = offline_app();

    let response = send(&app, empty_request("GET", "/api/catalog/products")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["source"], "mock");
    assert!(body["count"].as_u64().unwrap() > 0);
    assert!(body["fetched_at"].is_null());

    let response = send(&app, empty_request("GET", "/api/catalog/nomenclatures/drones")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["source"], "mock");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_invalid_nomenclature_id_is_rejected() {
    let app = offline_app();
    let response = send(&app, empty_request("GET", "/api/catalog/nomenclatures/tv.audio")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid nomenclature id");
}

#[tokio::test]
async fn test_mistyped_body_is_a_json_400() {
    let app = offline_app();
    let body = json!({ "email": 5, "password": "kettle-orbit-57" });

    let response = send(&app, json_request("POST", "/api/auth/login", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(json_body(response).await["error"], "Invalid JSON");
}

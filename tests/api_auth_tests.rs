// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Registration and login issue working session tokens
//! 2. Protected routes reject requests without valid tokens
//! 3. Profile updates apply partial changes and keep emails unique
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{create_test_app, register, send};

#[tokio::test]
async fn test_health_is_public() {
    let test = create_test_app();
    let (status, body) = send(&test.router, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body.get("buildId").is_some());
}

#[tokio::test]
async fn test_register_then_login() {
    let test = create_test_app();

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ann", "email": "Ann@Example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Ann");
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["role"], "user");
    assert!(body["token"].as_str().is_some());
    assert!(body.get("password").is_none());

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorites"], json!([]));
    assert_eq!(body["watchlist"], json!([]));

    let token = body["token"].as_str().unwrap();
    let (status, profile) = send(
        &test.router,
        Method::GET,
        "/api/auth/profile",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ann@example.com");
    assert_eq!(profile["recentlyViewed"], json!([]));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let test = create_test_app();
    register(&test.router, "Ann", "ann@example.com").await;

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "ANN@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_register_trims_padded_email() {
    let test = create_test_app();

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ann", "email": "  Ann@Example.COM ", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["email"], "ann@example.com");

    let (status, _) = send(
        &test.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ann", "email": "   ", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email: Please provide a valid email");
}

#[tokio::test]
async fn test_register_validation() {
    let test = create_test_app();

    let cases = [
        json!({ "name": "", "email": "a@example.com", "password": "secret123" }),
        json!({ "name": "Ann", "email": "not-an-email", "password": "secret123" }),
        json!({ "name": "Ann", "email": "a@example.com", "password": "short" }),
        json!({ "name": "Ann", "email": "a@example.com" }),
    ];

    for body in cases {
        let (status, response) = send(
            &test.router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        assert!(response["message"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let test = create_test_app();
    register(&test.router, "Ann", "ann@example.com").await;

    let (wrong_status, wrong_body) = send(
        &test.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "wrong-password" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &test.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let test = create_test_app();

    for uri in [
        "/api/auth/profile",
        "/api/users/favorites",
        "/api/users/check/603",
        "/api/reviews/user/my-reviews",
    ] {
        let (status, body) = send(&test.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["message"], "Not authorized, no token");
    }
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let test = create_test_app();
    let (status, body) = send(
        &test.router,
        Method::GET,
        "/api/auth/profile",
        Some("not.a.jwt"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_ignored() {
    let test = create_test_app();
    let (token, _) = register(&test.router, "Ann", "ann@example.com").await;

    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/profile")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let test = create_test_app();
    let (token, _) = register(&test.router, "Ann", "ann@example.com").await;
    register(&test.router, "Bob", "bob@example.com").await;

    // Empty fields leave values unchanged
    let (status, body) = send(
        &test.router,
        Method::PUT,
        "/api/auth/profile",
        Some(&token),
        Some(json!({ "name": "Annie", "email": "", "avatar": "https://img.example/a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Annie");
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["avatar"], "https://img.example/a.png");

    // The reissued token works
    let new_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(
        &test.router,
        Method::GET,
        "/api/auth/profile",
        Some(&new_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Another user's email is rejected
    let (status, body) = send(
        &test.router,
        Method::PUT,
        "/api/auth/profile",
        Some(&token),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    // Short password is rejected
    let (status, _) = send(
        &test.router,
        Method::PUT,
        "/api/auth/profile",
        Some(&token),
        Some(json!({ "password": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let test = create_test_app();

    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let test = create_test_app();
    let (status, body) = send(&test.router, Method::GET, "/api/nope", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_security_headers_present() {
    let test = create_test_app();
    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_cors_preflight() {
    let test = create_test_app();

    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/auth/profile")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_cors_rejects_foreign_origin() {
    let test = create_test_app();

    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

//! Tenant resolution and cross-tenant isolation.

mod common;

use axum::http::StatusCode;
use common::{TestApp, CENTRAL_DOMAIN};

#[tokio::test]
async fn unknown_domain_gets_uniform_404() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request_for_host(
            "nobody.example.test",
            "POST",
            "/api/register",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password123",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn central_domain_is_rejected_like_unknown() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request_for_host(CENTRAL_DOMAIN, "GET", "/api/users", None, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn host_port_suffix_is_stripped() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;

    let (status, _) = app
        .request_for_host(
            &format!("{}:8080", app.domain),
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password123",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_from_one_tenant_is_invalid_in_another() {
    let app = TestApp::spawn().await;
    app.add_tenant("beta.example.test").await;

    app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;

    // Valid where it was issued.
    let (status, _) = app
        .request("GET", "/api/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Invalid against the other tenant's domain, same credential.
    let (status, body) = app
        .request_for_host("beta.example.test", "GET", "/api/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn same_email_can_exist_in_two_tenants() {
    let app = TestApp::spawn().await;
    app.add_tenant("beta.example.test").await;

    app.register_user("a@example.test", "password123").await;

    let (status, _) = app
        .request_for_host(
            "beta.example.test",
            "POST",
            "/api/register",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password123",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
}

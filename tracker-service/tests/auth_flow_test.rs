//! Registration, login and account lifecycle.

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn register_then_login_roundtrip() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/register",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password123",
                "display_name": "Alice",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Credential and flag fields never leave the server.
    assert!(body.get("password_hash").is_none());
    assert!(body.get("is_admin").is_none());
    assert!(body.get("pin_code").is_none());

    let (status, body) = app
        .request(
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
    assert_eq!(body["token_type"], "Bearer");
    let credential = body["access_token"].as_str().expect("missing token");
    assert!(credential.contains('|'));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/register",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password456",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .request(
            "POST",
            "/api/register",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "short",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_collapse_to_one_error() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "wrongpassword",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({
                "email": "nobody@example.test",
                "password": "password123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn deactivated_user_cannot_login_and_their_tokens_die() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;
    app.register_admin("root@example.test", "password123").await;
    let admin_token = app.login("root@example.test", "password123").await;

    // Deactivate through the toggle route.
    let (status, body) = app
        .request(
            "POST",
            &format!("/api/users/{}", user_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    // The existing token is dead despite its hash still matching.
    let (status, body) = app
        .request("GET", "/api/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    // And a fresh login collapses to the same error.
    let (status, _) = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({
                "email": "a@example.test",
                "password": "password123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Toggling back restores login.
    let (status, body) = app
        .request(
            "POST",
            &format!("/api/users/{}", user_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);

    let (status, _) = app
        .request(
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
async fn pin_code_update_revokes_outstanding_tokens() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/pincode/{}", user_id),
            None,
            Some(serde_json::json!({ "pin_code": "4711" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request("GET", "/api/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Stored on the user record with its issuance timestamp.
    let user = app
        .state
        .store
        .find_user(app.tenant_id, user_id)
        .await
        .expect("store error")
        .expect("user missing");
    assert_eq!(user.pin_code.as_deref(), Some("4711"));
    assert!(user.pin_code_utc.is_some());
}

#[tokio::test]
async fn user_delete_is_soft_deactivation() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    app.register_admin("root@example.test", "password123").await;
    let admin_token = app.login("root@example.test", "password123").await;

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/users/{}", user_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The record survives, deactivated.
    let user = app
        .state
        .store
        .find_user(app.tenant_id, user_id)
        .await
        .expect("store error")
        .expect("user should still exist");
    assert!(!user.is_active);
}

#[tokio::test]
async fn malformed_request_body_gets_the_json_error_envelope() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request_raw("POST", "/api/register", None, "{not json")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // Well-formed JSON that fails to deserialize stays in the envelope
    // too, as 422.
    let (status, body) = app
        .request_raw("POST", "/api/register", None, r#"{"email": 7}"#)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation error");
}

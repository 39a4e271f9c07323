//! Credential validation and the sync/purge reconciliation routes.

mod common;

use axum::http::StatusCode;
use common::{parse_uuid, TestApp};
use tracker_service::models::Role;

#[tokio::test]
async fn malformed_and_tampered_credentials_are_rejected() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;

    for bad in [
        "not-a-credential",
        "|secretonly",
        "11111111-2222-3333-4444-555555555555|",
        &format!("{}x", token),
    ] {
        let (status, body) = app.request("GET", "/api/users", Some(bad), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "accepted: {}", bad);
        assert_eq!(body["error"], "Invalid credentials");
    }

    // The untampered credential still works.
    let (status, _) = app.request("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_authorization_header_is_unauthorized() {
    let app = TestApp::spawn().await;

    let (status, _) = app.request("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sync_issues_one_token_per_membership_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let event_a = app.seed_event("Event A").await;
    let event_b = app.seed_event("Event B").await;
    app.seed_membership(event_a, user_id, Role::Manager).await;
    app.seed_membership(event_b, user_id, Role::Basic).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["issued"].as_array().map(Vec::len), Some(2));

    // A second sync reporting the authoritative set finds everything
    // covered and issues nothing.
    let (status, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": body["tokens"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["issued"].as_array().map(Vec::len), Some(0));

    // The issued credentials actually validate.
    let first_sync_tokens = app
        .state
        .store
        .list_event_tokens_for_user(app.tenant_id, user_id)
        .await
        .expect("store error");
    assert_eq!(first_sync_tokens.len(), 2);
}

#[tokio::test]
async fn sync_drops_tokens_for_dead_memberships() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let event_id = app.seed_event("Event A").await;
    app.seed_membership(event_id, user_id, Role::Manager).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(1));
    let held = body["tokens"].clone();

    app.state
        .store
        .delete_membership(app.tenant_id, event_id, user_id)
        .await
        .expect("store error");

    let (_, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": held })),
        )
        .await;
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["issued"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn sync_replaces_tokens_the_client_no_longer_reports() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let event_id = app.seed_event("Event A").await;
    app.seed_membership(event_id, user_id, Role::Manager).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    let old_credential = body["issued"][0].as_str().expect("missing credential").to_string();

    // An empty report drops the stored token and covers the membership
    // with a fresh one.
    let (status, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["issued"].as_array().map(Vec::len), Some(1));

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/events/{}/users", event_id),
            Some(&old_credential),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purge_drops_tokens_the_client_no_longer_holds() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let event_a = app.seed_event("Event A").await;
    let event_b = app.seed_event("Event B").await;
    app.seed_membership(event_a, user_id, Role::Manager).await;
    app.seed_membership(event_b, user_id, Role::Basic).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    let token_ids: Vec<uuid::Uuid> = body["tokens"]
        .as_array()
        .expect("expected array")
        .iter()
        .map(parse_uuid)
        .collect();
    assert_eq!(token_ids.len(), 2);

    // The client only reports holding the first token.
    let (status, body) = app
        .request(
            "POST",
            "/api/token/purge",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [token_ids[0]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purged"], 1);

    let remaining = app
        .state
        .store
        .list_event_tokens_for_user(app.tenant_id, user_id)
        .await
        .expect("store error");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token_id, token_ids[0]);
}

#[tokio::test]
async fn purge_tolerates_unknown_token_ids() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/token/purge",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [uuid::Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purged"], 0);
}

#[tokio::test]
async fn event_token_credentials_from_sync_validate() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let user_token = app.login("a@example.test", "password123").await;

    let event_id = app.seed_event("Event A").await;
    app.seed_membership(event_id, user_id, Role::Manager).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/token/sync",
            Some(&user_token),
            Some(serde_json::json!({ "tokens": [] })),
        )
        .await;
    let credential = body["issued"][0].as_str().expect("missing credential");

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/events/{}/users", event_id),
            Some(credential),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

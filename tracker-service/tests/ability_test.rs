//! Route-level ability enforcement across token kinds.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use tracker_service::models::{Ability, Role};

#[tokio::test]
async fn write_token_reaches_read_and_write_routes() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;

    let (status, _) = app.request("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "POST",
            "/api/events",
            Some(&token),
            Some(serde_json::json!({ "event_label": "Spring fair" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn delete_routes_require_wildcard() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;
    let event_id = app.seed_event("Spring fair").await;

    // An ordinary write token is denied with the uniform body.
    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/events/{}", event_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    // An admin's wildcard token is not.
    app.register_admin("root@example.test", "password123").await;
    let admin_token = app.login("root@example.test", "password123").await;
    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/events/{}", event_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn write_token_denied_on_manager_routes() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;

    let (status, body) = app
        .request("GET", "/api/categories", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn event_token_denied_on_user_routes() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let event_id = app.seed_event("Spring fair").await;
    app.seed_membership(event_id, user_id, Role::Manager).await;
    let event_token = app.issue_event_token(user_id, event_id).await;

    let (status, body) = app
        .request("GET", "/api/users", Some(&event_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn manager_event_token_reaches_manager_routes() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let event_id = app.seed_event("Spring fair").await;
    app.seed_membership(event_id, user_id, Role::Manager).await;
    let event_token = app.issue_event_token(user_id, event_id).await;

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/events/{}/users", event_id),
            Some(&event_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn contributor_event_token_denied_on_manager_routes() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let event_id = app.seed_event("Spring fair").await;
    app.seed_membership(event_id, user_id, Role::Contributor)
        .await;
    let event_token = app.issue_event_token(user_id, event_id).await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/events/{}/users", event_id),
            Some(&event_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn manager_token_is_bound_to_its_own_event() {
    let app = TestApp::spawn().await;
    let user_id = app.register_user("a@example.test", "password123").await;
    let event_a = app.seed_event("Event A").await;
    let event_b = app.seed_event("Event B").await;
    app.seed_membership(event_a, user_id, Role::Manager).await;
    let event_token = app.issue_event_token(user_id, event_a).await;

    // Listing members of a different event misses.
    let (status, _) = app
        .request(
            "GET",
            &format!("/api/events/{}/users", event_b),
            Some(&event_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn self_ability_matches_only_the_acting_user() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("a@example.test", "password123").await;
    let bob = app.register_user("b@example.test", "password123").await;

    // A bare `self` token, without `write`.
    let user = app
        .state
        .store
        .find_user(app.tenant_id, alice)
        .await
        .expect("store error")
        .expect("user missing");
    let token = app
        .state
        .tokens
        .issue_user_token(app.tenant_id, &user, vec![Ability::SelfScoped])
        .await
        .expect("token issuance failed")
        .credential;

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/users/{}/events", alice),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/users/{}/events", bob),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn denial_and_miss_share_one_body() {
    let app = TestApp::spawn().await;
    app.register_user("a@example.test", "password123").await;
    app.register_admin("root@example.test", "password123").await;
    let token = app.login("a@example.test", "password123").await;
    let admin_token = app.login("root@example.test", "password123").await;

    // Denied: write token on an admin-only delete.
    let missing = uuid::Uuid::new_v4();
    let (denied_status, denied_body) = app
        .request(
            "DELETE",
            &format!("/api/events/{}", missing),
            Some(&token),
            None,
        )
        .await;

    // Missed: admin token on a nonexistent event.
    let (missed_status, missed_body) = app
        .request(
            "DELETE",
            &format!("/api/events/{}", missing),
            Some(&admin_token),
            None,
        )
        .await;

    assert_eq!(denied_status, missed_status);
    assert_eq!(denied_body, missed_body);
}

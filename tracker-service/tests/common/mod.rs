//! Test helpers: an in-memory application instance plus request
//! utilities shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;
use uuid::Uuid;

use service_core::config as core_config;
use service_core::middleware::rate_limit::create_ip_rate_limiter;

use tracker_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, RateLimitConfig, SecurityConfig, TrackerConfig,
    },
    models::{Role, Tenant},
    store::{MemoryStore, Store},
    AppState,
};

pub const CENTRAL_DOMAIN: &str = "admin.example.test";

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        common: core_config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "tracker-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        central_domains: vec![CENTRAL_DOMAIN.to_string()],
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            open_attempts: 1000,
            open_window_seconds: 60,
            global_ip_limit: 10000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub tenant_id: Uuid,
    pub domain: String,
}

impl TestApp {
    /// Spawn an app over a fresh in-memory store with one registered
    /// tenant.
    pub async fn spawn() -> Self {
        Self::spawn_with_domain("alpha.example.test").await
    }

    pub async fn spawn_with_domain(domain: &str) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        let tenant = Tenant::new(domain.to_string(), "Test tenant".to_string());
        let tenant_id = tenant.tenant_id;
        store
            .insert_tenant(&tenant)
            .await
            .expect("Failed to seed tenant");

        let config = test_config();
        let open_limiter = create_ip_rate_limiter(
            config.rate_limit.open_attempts,
            config.rate_limit.open_window_seconds,
        );
        let ip_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        let state = AppState::new(config, store, open_limiter, ip_limiter);
        let app = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            app,
            state,
            tenant_id,
            domain: domain.to_string(),
        }
    }

    /// Register a second tenant against the same store and return its
    /// id and domain.
    pub async fn add_tenant(&self, domain: &str) -> Uuid {
        let tenant = Tenant::new(domain.to_string(), "Other tenant".to_string());
        let tenant_id = tenant.tenant_id;
        self.state
            .store
            .insert_tenant(&tenant)
            .await
            .expect("Failed to seed tenant");
        tenant_id
    }

    /// One request against the router; returns status and parsed body.
    /// An empty body parses as JSON null.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request_for_host(&self.domain, method, path, bearer, body)
            .await
    }

    /// One request with a verbatim body, for payloads that are not
    /// valid JSON.
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        bearer: Option<&str>,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", self.domain.as_str())
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let response = self
            .app
            .clone()
            .oneshot(
                builder
                    .body(Body::from(body.to_string()))
                    .expect("Failed to build request"),
            )
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        (status, json)
    }

    pub async fn request_for_host(
        &self,
        host: &str,
        method: &str,
        path: &str,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", host)
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => Body::from(serde_json::to_vec(&json).expect("Failed to encode body")),
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("Failed to build request"))
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        (status, json)
    }

    /// Register a user through the API and return their id.
    pub async fn register_user(&self, email: &str, password: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                "/api/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": password,
                    "display_name": "Test user",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        parse_uuid(&body["user_id"])
    }

    /// Login through the API and return the bearer credential.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Register a user and promote them to admin directly in the store.
    pub async fn register_admin(&self, email: &str, password: &str) -> Uuid {
        let user_id = self.register_user(email, password).await;
        let mut user = self
            .state
            .store
            .find_user(self.tenant_id, user_id)
            .await
            .expect("store error")
            .expect("user missing");
        user.is_admin = true;
        self.state
            .store
            .update_user(self.tenant_id, &user)
            .await
            .expect("store error");
        user_id
    }

    /// Create an event directly in the store.
    pub async fn seed_event(&self, label: &str) -> Uuid {
        let event = tracker_service::models::Event::new(label.to_string(), None);
        let event_id = event.event_id;
        self.state
            .store
            .insert_event(self.tenant_id, &event)
            .await
            .expect("store error");
        event_id
    }

    /// Attach a membership directly in the store.
    pub async fn seed_membership(&self, event_id: Uuid, user_id: Uuid, role: Role) {
        let membership = tracker_service::models::EventUser::new(event_id, user_id, role);
        self.state
            .store
            .insert_membership(self.tenant_id, &membership)
            .await
            .expect("store error");
    }

    /// Issue an event token for the pair and return the credential.
    pub async fn issue_event_token(&self, user_id: Uuid, event_id: Uuid) -> String {
        self.state
            .tokens
            .issue_event_token(self.tenant_id, user_id, event_id)
            .await
            .expect("token issuance failed")
            .credential
    }
}

pub fn parse_uuid(value: &serde_json::Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("expected a UUID string")
}

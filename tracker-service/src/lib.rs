pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use service_core::error::AppError;
use service_core::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::request_id_middleware;

use crate::config::TrackerConfig;
use crate::middleware::{auth_middleware, require_abilities, tenant_middleware};
use crate::models::Ability;
use crate::services::{
    AccountService, MembershipService, RoleResolver, TenantDirectory, TokenService,
};
use crate::store::Store;

/// Ability lists declared per route group, mirroring the API surface:
/// reads and ordinary writes for user tokens, deletes for admins,
/// membership and finance detail routes for event-token managers.
const USER_WRITE: &[Ability] = &[Ability::Wildcard, Ability::Write];
const ADMIN_ONLY: &[Ability] = &[Ability::Wildcard];
const MANAGER: &[Ability] = &[Ability::Wildcard, Ability::Manager];

#[derive(Clone)]
pub struct AppState {
    pub config: TrackerConfig,
    pub store: Arc<dyn Store>,
    pub tenants: TenantDirectory,
    pub roles: RoleResolver,
    pub tokens: TokenService,
    pub memberships: MembershipService,
    pub accounts: AccountService,
    pub open_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire the service graph over a store backend.
    pub fn new(
        config: TrackerConfig,
        store: Arc<dyn Store>,
        open_rate_limiter: IpRateLimiter,
        ip_rate_limiter: IpRateLimiter,
    ) -> Self {
        let tenants = TenantDirectory::new(store.clone(), config.central_domains.clone());
        let roles = RoleResolver::new(store.clone());
        let tokens = TokenService::new(store.clone(), roles.clone());
        let memberships = MembershipService::new(store.clone());
        let accounts = AccountService::new(store.clone(), tokens.clone());

        Self {
            config,
            store,
            tenants,
            roles,
            tokens,
            memberships,
            accounts,
            open_rate_limiter,
            ip_rate_limiter,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Open routes: reachable without a token, throttled harder.
    let open_limiter = state.open_rate_limiter.clone();
    let open_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/pincode/:user_id", put(handlers::auth::pincode))
        .layer(from_fn_with_state(open_limiter, ip_rate_limit_middleware));

    // User-token routes.
    let user_write_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::user::index).post(handlers::user::seed),
        )
        .route(
            "/api/users/:user_id",
            get(handlers::user::show)
                .put(handlers::user::update)
                .post(handlers::user::toggle_is_active),
        )
        .route(
            "/api/events",
            get(handlers::event::index).post(handlers::event::store),
        )
        .route(
            "/api/events/:event_id",
            get(handlers::event::show).put(handlers::event::update),
        )
        .route(
            "/api/bankaccounts",
            get(handlers::bank_account::index).post(handlers::bank_account::store),
        )
        .route(
            "/api/bankaccounts/:account_id",
            get(handlers::bank_account::show).put(handlers::bank_account::update),
        )
        .layer(from_fn(|req: axum::extract::Request, next: axum::middleware::Next| {
            require_abilities(USER_WRITE, req, next)
        }));

    // Deletes are reserved for wildcard tokens.
    let admin_routes = Router::new()
        .route(
            "/api/users/:user_id",
            axum::routing::delete(handlers::user::destroy),
        )
        .route(
            "/api/events/:event_id",
            axum::routing::delete(handlers::event::destroy),
        )
        .route(
            "/api/bankaccounts/:account_id",
            axum::routing::delete(handlers::bank_account::destroy),
        )
        .route(
            "/api/categories/:category_id",
            axum::routing::delete(handlers::category::destroy),
        )
        .route(
            "/api/items/:item_id",
            axum::routing::delete(handlers::item::destroy),
        )
        .layer(from_fn(|req: axum::extract::Request, next: axum::middleware::Next| {
            require_abilities(ADMIN_ONLY, req, next)
        }));

    // Event-token routes: membership, categories and items.
    let manager_routes = Router::new()
        .route(
            "/api/events/:event_id/users",
            get(handlers::event_user::index).post(handlers::event_user::store),
        )
        .route(
            "/api/events/:event_id/users/:user_id",
            put(handlers::event_user::update).delete(handlers::event_user::destroy),
        )
        .route(
            "/api/events/:event_id/categories",
            get(handlers::category::index_for_event).post(handlers::category::store),
        )
        .route(
            "/api/events/:event_id/categories/:category_id",
            put(handlers::category::update),
        )
        .route("/api/categories", get(handlers::category::index))
        .route("/api/categories/:category_id", get(handlers::category::show))
        .route(
            "/api/categories/:category_id/items",
            get(handlers::item::index_for_category).post(handlers::item::store),
        )
        .route(
            "/api/categories/:category_id/items/:item_id",
            put(handlers::item::update),
        )
        .route("/api/items", get(handlers::item::index))
        .route("/api/items/:item_id", get(handlers::item::show))
        .layer(from_fn(
            |req: axum::extract::Request, next: axum::middleware::Next| {
                require_abilities(MANAGER, req, next)
            },
        ));

    // Authenticated but not ability-gated at the route: token
    // reconciliation, and the own-events listing whose `self` target
    // is checked in the handler.
    let token_routes = Router::new()
        .route("/api/token/sync", post(handlers::token::sync))
        .route("/api/token/purge", post(handlers::token::purge))
        .route("/api/users/:user_id/events", get(handlers::user::events));

    let protected_routes = user_write_routes
        .merge(admin_routes)
        .merge(manager_routes)
        .merge(token_routes)
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // Everything under /api is tenant-scoped.
    let api_routes = open_routes
        .merge(protected_routes)
        .layer(from_fn_with_state(state.clone(), tenant_middleware));

    let ip_limiter = state.ip_rate_limiter.clone();

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .fallback(fallback)
        .with_state(state.clone())
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}

/// Uniform 404 body for unknown routes, identical to the denial and
/// miss responses on known ones.
async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

//! Token reconciliation routes.

use axum::{extract::State, response::IntoResponse};

use service_core::error::AppError;

use crate::middleware::{AuthUser, CurrentTenant, Json};
use crate::models::TokenSetRequest;
use crate::AppState;

/// Reconcile the caller's event tokens with their memberships, given
/// the token ids the client reports holding, and return the
/// authoritative set. Freshly issued credentials appear once, in this
/// response.
pub async fn sync(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Json(req): Json<TokenSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let set = state
        .tokens
        .sync(tenant.tenant_id, identity.user_id, &req.tokens)
        .await?;
    Ok(Json(set))
}

/// Drop server-side tokens the client reports it no longer holds,
/// along with any whose membership is gone. Meant to run before sync.
pub async fn purge(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Json(req): Json<TokenSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let purged = state
        .tokens
        .purge(tenant.tenant_id, identity.user_id, &req.tokens)
        .await?;
    Ok(Json(serde_json::json!({ "purged": purged })))
}

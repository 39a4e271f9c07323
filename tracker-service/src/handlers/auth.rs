//! Open (throttled) routes: registration, login and PIN update.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use service_core::error::AppError;

use crate::middleware::{CurrentTenant, Json};
use crate::models::{LoginRequest, PinCodeRequest, RegisterRequest, TokenResponse};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state
        .accounts
        .register(tenant.tenant_id, req.email, req.password, req.display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

pub async fn login(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (_, token) = state
        .accounts
        .login(tenant.tenant_id, &req.email, req.password)
        .await?;

    Ok(Json(TokenResponse::new(token.credential)))
}

/// Store a new PIN challenge for the user and revoke their tokens.
/// Reachable without authentication; it is the recovery path.
pub async fn pincode(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(user_id): Path<Uuid>,
    Json(req): Json<PinCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state
        .accounts
        .set_pin_code(tenant.tenant_id, user_id, req.pin_code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

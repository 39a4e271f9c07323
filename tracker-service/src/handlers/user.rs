//! User routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use service_core::error::AppError;

use crate::middleware::{AuthUser, CurrentTenant, Json};
use crate::models::{Ability, Event, RegisterRequest, UpdateUserRequest, UserResponse};
use crate::services::{authorize, ServiceError, Target};
use crate::AppState;

const VIEW_OWN_EVENTS: &[Ability] = &[Ability::Wildcard, Ability::Write, Ability::SelfScoped];

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users(tenant.tenant_id).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user(tenant.tenant_id, user_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(user.sanitized()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .accounts
        .update_profile(tenant.tenant_id, user_id, req.display_name)
        .await?;
    Ok(Json(user.sanitized()))
}

/// Soft delete. The record stays; the account is deactivated and all
/// its tokens are revoked.
pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.deactivate(tenant.tenant_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Seed a new unprivileged user.
pub async fn seed(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state
        .accounts
        .seed(tenant.tenant_id, req.email, req.password, req.display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

pub async fn toggle_is_active(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .accounts
        .toggle_active(tenant.tenant_id, user_id)
        .await?;
    Ok(Json(serde_json::json!({
        "user_id": user.user_id,
        "is_active": user.is_active,
    })))
}

/// Events the user belongs to. `self` only grants it on the acting
/// user's own id, so the ability check runs here with the path
/// parameter as the target.
pub async fn events(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&identity, VIEW_OWN_EVENTS, Target::OwnUser(user_id))?;

    let memberships = state
        .store
        .list_memberships_for_user(tenant.tenant_id, user_id)
        .await?;

    let mut events: Vec<Event> = Vec::with_capacity(memberships.len());
    for membership in memberships {
        if let Some(event) = state
            .store
            .find_event(tenant.tenant_id, membership.event_id)
            .await?
        {
            events.push(event);
        }
    }

    Ok(Json(events))
}

//! Membership routes, reached with event tokens.
//!
//! The ability layer admits manager tokens; binding to the event named
//! in the path happens inside the membership service, which authorizes
//! again with the precise target before every mutation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::middleware::{AuthUser, CurrentTenant, Json};
use crate::models::{AttachUserRequest, UpdateRoleRequest};
use crate::AppState;

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let members = state
        .memberships
        .members_of(&identity, tenant.tenant_id, event_id)
        .await?;
    Ok(Json(members))
}

pub async fn store(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<AttachUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state
        .memberships
        .attach(&identity, tenant.tenant_id, event_id, req.user_id, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state
        .memberships
        .update_role(&identity, tenant.tenant_id, event_id, user_id, req.role)
        .await?;
    Ok(Json(membership))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .memberships
        .detach(&identity, tenant.tenant_id, event_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

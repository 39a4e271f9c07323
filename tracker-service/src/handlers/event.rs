//! Event CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::middleware::{CurrentTenant, Json};
use crate::models::{CreateEventRequest, Event, UpdateEventRequest};
use crate::services::ServiceError;
use crate::AppState;

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<impl IntoResponse, AppError> {
    let events = state.store.list_events(tenant.tenant_id).await?;
    Ok(Json(events))
}

pub async fn store(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    // A dangling bank account link is never created.
    if let Some(account_id) = req.bank_account_id {
        state
            .store
            .find_bank_account(tenant.tenant_id, account_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
    }

    let mut event = Event::new(req.event_label, req.description);
    event.bank_account_id = req.bank_account_id;
    state.store.insert_event(tenant.tenant_id, &event).await?;

    tracing::info!(event_id = %event.event_id, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let event = state
        .store
        .find_event(tenant.tenant_id, event_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(event))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut event = state
        .store
        .find_event(tenant.tenant_id, event_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if let Some(label) = req.event_label {
        event.event_label = label;
    }
    if req.description.is_some() {
        event.description = req.description;
    }
    if let Some(account_id) = req.bank_account_id {
        state
            .store
            .find_bank_account(tenant.tenant_id, account_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        event.bank_account_id = Some(account_id);
    }

    state.store.update_event(tenant.tenant_id, &event).await?;

    Ok(Json(event))
}

/// Delete an event. Its memberships go with it; event tokens bound to
/// it fail at next validation.
pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_event(tenant.tenant_id, event_id).await?;
    if !deleted {
        return Err(ServiceError::NotFound.into());
    }

    tracing::info!(event_id = %event_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}

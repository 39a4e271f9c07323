//! Category routes, reached with event tokens.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::middleware::{AuthUser, CurrentTenant, Json};
use crate::models::{Ability, Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::services::{authorize, ServiceError, Target};
use crate::AppState;

const MANAGE: &[Ability] = &[Ability::Wildcard, Ability::Manager];

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.store.list_categories(tenant.tenant_id).await?;
    Ok(Json(categories))
}

/// Categories of one event. Bound to the event named in the path.
pub async fn index_for_event(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&identity, MANAGE, Target::Event(event_id))?;

    let categories = state
        .store
        .list_categories_for_event(tenant.tenant_id, event_id)
        .await?;
    Ok(Json(categories))
}

pub async fn store(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&identity, MANAGE, Target::Event(event_id))?;

    state
        .store
        .find_event(tenant.tenant_id, event_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let category = Category::new(event_id, req.category_label);
    state
        .store
        .insert_category(tenant.tenant_id, &category)
        .await?;

    tracing::info!(category_id = %category.category_id, event_id = %event_id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .store
        .find_category(tenant.tenant_id, category_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(category))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path((event_id, category_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&identity, MANAGE, Target::Event(event_id))?;

    let mut category = state
        .store
        .find_category(tenant.tenant_id, category_id)
        .await?
        .filter(|c| c.event_id == event_id)
        .ok_or(ServiceError::NotFound)?;

    category.category_label = req.category_label;
    state
        .store
        .update_category(tenant.tenant_id, &category)
        .await?;

    Ok(Json(category))
}

/// Delete a category and its items.
pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .store
        .delete_category(tenant.tenant_id, category_id)
        .await?;
    if !deleted {
        return Err(ServiceError::NotFound.into());
    }

    tracing::info!(category_id = %category_id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}

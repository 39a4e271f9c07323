//! Item routes, reached with event tokens.
//!
//! Items hang off a category, which hangs off an event; manager
//! binding for mutations goes through the owning category's event.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::middleware::{AuthUser, CurrentTenant, Json};
use crate::models::{Ability, Category, CreateItemRequest, Item, UpdateItemRequest};
use crate::services::{authorize, IdentityContext, ServiceError, Target};
use crate::AppState;

const MANAGE: &[Ability] = &[Ability::Wildcard, Ability::Manager];

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<impl IntoResponse, AppError> {
    let items = state.store.list_items(tenant.tenant_id).await?;
    Ok(Json(items))
}

/// Items of one category. Bound to the owning event.
pub async fn index_for_category(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category =
        owning_category(&state, tenant.tenant_id, category_id, &identity).await?;

    let items = state
        .store
        .list_items_for_category(tenant.tenant_id, category.category_id)
        .await?;
    Ok(Json(items))
}

pub async fn store(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path(category_id): Path<Uuid>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    owning_category(&state, tenant.tenant_id, category_id, &identity).await?;

    let item = Item::new(category_id, req.item_label, req.amount_cents);
    state.store.insert_item(tenant.tenant_id, &item).await?;

    tracing::info!(item_id = %item.item_id, category_id = %category_id, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .store
        .find_item(tenant.tenant_id, item_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(item))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    AuthUser(identity): AuthUser,
    Path((category_id, item_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    owning_category(&state, tenant.tenant_id, category_id, &identity).await?;

    let mut item = state
        .store
        .find_item(tenant.tenant_id, item_id)
        .await?
        .filter(|i| i.category_id == category_id)
        .ok_or(ServiceError::NotFound)?;

    if let Some(label) = req.item_label {
        item.item_label = label;
    }
    if let Some(amount) = req.amount_cents {
        item.amount_cents = amount;
    }
    state.store.update_item(tenant.tenant_id, &item).await?;

    Ok(Json(item))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_item(tenant.tenant_id, item_id).await?;
    if !deleted {
        return Err(ServiceError::NotFound.into());
    }

    tracing::info!(item_id = %item_id, "Item deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the category and authorize `manager` against its event.
async fn owning_category(
    state: &AppState,
    tenant_id: Uuid,
    category_id: Uuid,
    identity: &IdentityContext,
) -> Result<Category, AppError> {
    let category = state
        .store
        .find_category(tenant_id, category_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    authorize(identity, MANAGE, Target::Event(category.event_id))?;

    Ok(category)
}

//! Bank account CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use service_core::error::AppError;

use crate::middleware::{CurrentTenant, Json};
use crate::models::{BankAccount, CreateBankAccountRequest, UpdateBankAccountRequest};
use crate::services::ServiceError;
use crate::AppState;

/// Single-account response. The manager set is derived live from the
/// linked events' memberships; it is never stored with the account.
#[derive(Debug, Serialize)]
pub struct BankAccountDetail {
    #[serde(flatten)]
    pub account: BankAccount,
    pub managers: Vec<Uuid>,
}

pub async fn index(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<impl IntoResponse, AppError> {
    let accounts = state.store.list_bank_accounts(tenant.tenant_id).await?;
    Ok(Json(accounts))
}

pub async fn store(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(req): Json<CreateBankAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = BankAccount::new(req.account_label, req.iban);
    state
        .store
        .insert_bank_account(tenant.tenant_id, &account)
        .await?;

    tracing::info!(account_id = %account.account_id, "Bank account created");

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_bank_account(tenant.tenant_id, account_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let managers = state.roles.managers_of(tenant.tenant_id, account_id).await?;

    Ok(Json(BankAccountDetail { account, managers }))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(account_id): Path<Uuid>,
    Json(req): Json<UpdateBankAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut account = state
        .store
        .find_bank_account(tenant.tenant_id, account_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if let Some(label) = req.account_label {
        account.account_label = label;
    }
    if req.iban.is_some() {
        account.iban = req.iban;
    }
    if let Some(balance) = req.balance_cents {
        account.balance_cents = balance;
    }

    state
        .store
        .update_bank_account(tenant.tenant_id, &account)
        .await?;

    Ok(Json(account))
}

/// Delete an account. Linked events keep existing with their account
/// reference cleared.
pub async fn destroy(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .store
        .delete_bank_account(tenant.tenant_id, account_id)
        .await?;
    if !deleted {
        return Err(ServiceError::NotFound.into());
    }

    tracing::info!(account_id = %account_id, "Bank account deleted");

    Ok(StatusCode::NO_CONTENT)
}

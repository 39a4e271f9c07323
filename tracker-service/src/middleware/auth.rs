//! Bearer credential authentication.
//!
//! Splits the `Authorization: Bearer <id>|<secret>` credential, looks
//! the token up within the resolved tenant and validates the secret.
//! The resulting identity context carries static abilities for user
//! tokens and a freshly resolved role for event tokens. All failure
//! modes collapse into one 401 response.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::{IdentityContext, ServiceError, TenantContext};
use crate::AppState;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let tenant = req
        .extensions()
        .get::<TenantContext>()
        .cloned()
        .ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Tenant context missing from request extensions"
            ))
        })?;

    let credential = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ServiceError::InvalidToken)?;

    let identity = state.tokens.validate(tenant.tenant_id, credential).await?;

    tracing::debug!(
        user_id = %identity.user_id,
        kind = ?identity.kind,
        "Credential validated"
    );

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated identity in handlers.
pub struct AuthUser(pub IdentityContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Identity context missing from request extensions"
                ))
            })
    }
}

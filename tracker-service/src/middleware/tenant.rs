//! Tenant initialization middleware.
//!
//! Every API request is scoped to a tenant resolved from the Host
//! header before anything else runs. An unknown host, a central domain
//! or a missing header all produce the same uniform not-found response,
//! so probing for tenant domains tells an outsider nothing.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::TenantContext;
use crate::AppState;

pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let tenant = state.tenants.resolve(host).await?;
    let context = TenantContext::from(&tenant);

    tracing::debug!(tenant_id = %context.tenant_id, domain = %context.domain, "Tenant resolved");

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Extractor for the resolved tenant in handlers.
pub struct CurrentTenant(pub TenantContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(CurrentTenant)
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Tenant context missing from request extensions"
                ))
            })
    }
}

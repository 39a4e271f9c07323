//! Per-route ability enforcement.
//!
//! Each protected route group declares its required ability list and
//! wraps itself in this layer. The check here runs against an
//! unspecific target; routes whose abilities are target-sensitive
//! (`self` against an owning user, `manager` against a named event)
//! authorize again in the handler or service once the path parameters
//! are resolved.

use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use crate::models::Ability;
use crate::services::{authorize, IdentityContext, Target};

pub async fn require_abilities(
    required: &'static [Ability],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<IdentityContext>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Identity context missing from request extensions"
        ))
    })?;

    if let Err(e) = authorize(identity, required, Target::Any) {
        tracing::warn!(
            user_id = %identity.user_id,
            required = ?required,
            "Ability check failed"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

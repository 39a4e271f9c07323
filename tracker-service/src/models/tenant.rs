//! Tenant model - root of the multi-tenancy hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant entity. One tenant per inbound domain; every store operation
/// is scoped to exactly one tenant for the duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub tenant_id: Uuid,
    /// Domain the tenant is reached under, matched exactly against the
    /// request Host header (port stripped).
    pub domain: String,
    pub tenant_label: String,
    pub created_utc: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant.
    pub fn new(domain: String, tenant_label: String) -> Self {
        Self {
            tenant_id: Uuid::new_v4(),
            domain,
            tenant_label,
            created_utc: Utc::now(),
        }
    }
}

/// Tenant response for API.
#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub tenant_id: Uuid,
    pub domain: String,
    pub tenant_label: String,
    pub created_utc: DateTime<Utc>,
}

impl From<Tenant> for TenantResponse {
    fn from(t: Tenant) -> Self {
        Self {
            tenant_id: t.tenant_id,
            domain: t.domain,
            tenant_label: t.tenant_label,
            created_utc: t.created_utc,
        }
    }
}

//! Tenant resolution.
//!
//! Maps the inbound Host header to a tenant partition. Resolution is
//! request-scoped: the resolved tenant travels in an explicit context
//! value, never in process-global state, so concurrent requests for
//! different tenants cannot observe each other.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::Tenant;
use crate::services::ServiceError;
use crate::store::Store;

/// Tenant context attached to every request after resolution.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub domain: String,
}

impl From<&Tenant> for TenantContext {
    fn from(t: &Tenant) -> Self {
        Self {
            tenant_id: t.tenant_id,
            domain: t.domain.clone(),
        }
    }
}

/// Resolves domains against the tenant registry.
#[derive(Clone)]
pub struct TenantDirectory {
    store: Arc<dyn Store>,
    /// Administrative domains that must never reach tenant routes.
    central_domains: Vec<String>,
}

impl TenantDirectory {
    pub fn new(store: Arc<dyn Store>, central_domains: Vec<String>) -> Self {
        Self {
            store,
            central_domains,
        }
    }

    /// Resolve a Host header value to a tenant.
    ///
    /// The port suffix is stripped; the remaining domain must match a
    /// registered tenant exactly. A central (administrative) domain is
    /// rejected the same way as an unknown one so tenant routes cannot
    /// be reached through it. Failure is terminal for the request.
    pub async fn resolve(&self, host: &str) -> Result<Tenant, ServiceError> {
        let domain = strip_port(host);
        if domain.is_empty() || self.is_central(domain) {
            return Err(ServiceError::NoSuchTenant);
        }

        self.store
            .find_tenant_by_domain(domain)
            .await?
            .ok_or(ServiceError::NoSuchTenant)
    }

    /// Whether the domain is one of the configured central domains.
    pub fn is_central(&self, host: &str) -> bool {
        let domain = strip_port(host);
        self.central_domains.iter().any(|d| d == domain)
    }
}

fn strip_port(host: &str) -> &str {
    host.rsplit_once(':')
        .map(|(domain, _)| domain)
        .unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("alpha.example.com:8080"), "alpha.example.com");
        assert_eq!(strip_port("alpha.example.com"), "alpha.example.com");
        assert_eq!(strip_port(""), "");
    }
}

//! Role resolution.
//!
//! Roles are derived from the membership pivot at the moment they are
//! needed, never cached across requests: a membership can change or
//! disappear between a token's issuance and its use, and the very next
//! use must see the new state.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::Role;
use crate::services::ServiceError;
use crate::store::Store;

#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn Store>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The user's role on the event, from the unique membership row.
    /// `None` means no membership and is treated as "no access" by
    /// callers, never as a failure.
    pub async fn role_of(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Role>, ServiceError> {
        let membership = self
            .store
            .find_membership(tenant_id, event_id, user_id)
            .await?;
        Ok(membership.map(|m| m.role))
    }

    /// Whether the user manages the bank account.
    ///
    /// Derived at query time as "holds the manager role on at least one
    /// event linked to the account". There is no stored manager set to
    /// go stale when role grants change.
    pub async fn is_managed_by(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let events = self
            .store
            .list_events_for_bank_account(tenant_id, account_id)
            .await?;
        for event in events {
            if self.role_of(tenant_id, user_id, event.event_id).await? == Some(Role::Manager) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// All users holding the manager role on any event linked to the
    /// account, deduplicated.
    pub async fn managers_of(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let events = self
            .store
            .list_events_for_bank_account(tenant_id, account_id)
            .await?;
        let mut managers = Vec::new();
        for event in events {
            for membership in self
                .store
                .list_memberships_for_event(tenant_id, event.event_id)
                .await?
            {
                if membership.role == Role::Manager && !managers.contains(&membership.user_id) {
                    managers.push(membership.user_id);
                }
            }
        }
        Ok(managers)
    }
}

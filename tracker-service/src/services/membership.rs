//! Event-user membership management.
//!
//! The mutation surface the role resolver reads from. Every mutation
//! authorizes `manager` on the targeted event through the gate before
//! touching the row, so membership changes and their own authorization
//! always travel together. Store mutations are single atomic
//! operations; concurrent writers race to a last-writer-wins outcome
//! but can never leave a half-applied row.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Ability, EventUser, Role};
use crate::services::{IdentityContext, ServiceError, Target, authorize};
use crate::store::{Store, StoreError};

const MUTATE_MEMBERSHIP: &[Ability] = &[Ability::Wildcard, Ability::Manager];

#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn Store>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Attach a user to an event with a role.
    pub async fn attach(
        &self,
        ctx: &IdentityContext,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<EventUser, ServiceError> {
        authorize(ctx, MUTATE_MEMBERSHIP, Target::Event(event_id))?;

        // The pair must reference live records; a membership cannot
        // exist without both sides.
        if self.store.find_event(tenant_id, event_id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        if self.store.find_user(tenant_id, user_id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let membership = EventUser::new(event_id, user_id, role);
        match self.store.insert_membership(tenant_id, &membership).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %event_id,
                    user_id = %user_id,
                    role = %role,
                    "Membership attached"
                );
                Ok(membership)
            }
            Err(StoreError::Duplicate) => Err(ServiceError::DuplicateMembership),
            Err(e) => Err(e.into()),
        }
    }

    /// Change the role of an existing membership. Takes effect on the
    /// pair's event tokens at their very next validation.
    pub async fn update_role(
        &self,
        ctx: &IdentityContext,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<EventUser, ServiceError> {
        authorize(ctx, MUTATE_MEMBERSHIP, Target::Event(event_id))?;

        let updated = self
            .store
            .update_membership_role(tenant_id, event_id, user_id, role)
            .await?;
        if !updated {
            return Err(ServiceError::MembershipNotFound);
        }

        tracing::info!(
            event_id = %event_id,
            user_id = %user_id,
            role = %role,
            "Membership role updated"
        );

        Ok(EventUser::new(event_id, user_id, role))
    }

    /// Detach a user from an event. Event tokens for the pair are not
    /// touched here; they die lazily when validation next resolves the
    /// missing membership.
    pub async fn detach(
        &self,
        ctx: &IdentityContext,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        authorize(ctx, MUTATE_MEMBERSHIP, Target::Event(event_id))?;

        let deleted = self
            .store
            .delete_membership(tenant_id, event_id, user_id)
            .await?;
        if !deleted {
            return Err(ServiceError::MembershipNotFound);
        }

        tracing::info!(event_id = %event_id, user_id = %user_id, "Membership detached");

        Ok(())
    }

    /// Memberships of an event, for the member listing route.
    pub async fn members_of(
        &self,
        ctx: &IdentityContext,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<EventUser>, ServiceError> {
        authorize(ctx, MUTATE_MEMBERSHIP, Target::Event(event_id))?;
        Ok(self
            .store
            .list_memberships_for_event(tenant_id, event_id)
            .await?)
    }
}

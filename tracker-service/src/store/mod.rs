//! Storage abstraction.
//!
//! Every operation takes the resolved tenant id as its first argument:
//! tenant scoping is explicit context, never ambient process state, so
//! concurrent requests for different tenants can never bleed into each
//! other. Two implementations exist, the Postgres-backed [`PgStore`]
//! used in production and the [`MemoryStore`] used by tests and dev
//! mode.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccessToken, BankAccount, Category, Event, EventUser, Item, Role, Tenant, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation (duplicate membership, duplicate email).
    #[error("Duplicate record")]
    Duplicate,

    #[error("Store error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(anyhow::Error::new(err))
    }
}

/// Tenant-partitioned data store.
///
/// Reads reflect current stored state at the instant of the call; no
/// implementation may cache across requests. Mutations are atomic: a
/// row is either fully applied or untouched.
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Tenants ====================

    /// Exact-match lookup of a tenant by domain. The tenant registry is
    /// global; everything below it is partitioned.
    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, StoreError>;

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), StoreError>;

    // ==================== Users ====================

    /// Fails with [`StoreError::Duplicate`] when the email is taken
    /// within the tenant.
    async fn insert_user(&self, tenant_id: Uuid, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn list_users(&self, tenant_id: Uuid) -> Result<Vec<User>, StoreError>;

    /// Full-row update keyed on `user.user_id`. Returns false when the
    /// user does not exist in this tenant.
    async fn update_user(&self, tenant_id: Uuid, user: &User) -> Result<bool, StoreError>;

    // ==================== Events ====================

    async fn insert_event(&self, tenant_id: Uuid, event: &Event) -> Result<(), StoreError>;

    async fn find_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Event>, StoreError>;

    async fn list_events(&self, tenant_id: Uuid) -> Result<Vec<Event>, StoreError>;

    async fn update_event(&self, tenant_id: Uuid, event: &Event) -> Result<bool, StoreError>;

    /// Deletes the event together with its memberships.
    async fn delete_event(&self, tenant_id: Uuid, event_id: Uuid) -> Result<bool, StoreError>;

    // ==================== Memberships ====================

    async fn find_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<EventUser>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when a membership already
    /// exists for the pair.
    async fn insert_membership(
        &self,
        tenant_id: Uuid,
        membership: &EventUser,
    ) -> Result<(), StoreError>;

    /// Returns false when no membership exists for the pair.
    async fn update_membership_role(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<bool, StoreError>;

    /// Returns false when no membership exists for the pair.
    async fn delete_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn list_memberships_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError>;

    async fn list_memberships_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError>;

    // ==================== Tokens ====================

    async fn insert_token(&self, tenant_id: Uuid, token: &AccessToken) -> Result<(), StoreError>;

    async fn find_token(
        &self,
        tenant_id: Uuid,
        token_id: Uuid,
    ) -> Result<Option<AccessToken>, StoreError>;

    /// Returns false when the token is already gone.
    async fn delete_token(&self, tenant_id: Uuid, token_id: Uuid) -> Result<bool, StoreError>;

    /// Deletes every token of the user, both kinds.
    async fn delete_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, StoreError>;

    async fn list_event_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<AccessToken>, StoreError>;

    // ==================== Bank accounts ====================

    async fn insert_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<(), StoreError>;

    async fn find_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<BankAccount>, StoreError>;

    async fn list_bank_accounts(&self, tenant_id: Uuid) -> Result<Vec<BankAccount>, StoreError>;

    async fn update_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<bool, StoreError>;

    async fn delete_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<bool, StoreError>;

    /// Events currently linked to the account. Input to the derived
    /// manager computation; never cached.
    async fn list_events_for_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Event>, StoreError>;

    // ==================== Categories ====================

    async fn insert_category(&self, tenant_id: Uuid, category: &Category)
        -> Result<(), StoreError>;

    async fn find_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, StoreError>;

    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, StoreError>;

    async fn list_categories_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<Category>, StoreError>;

    async fn update_category(
        &self,
        tenant_id: Uuid,
        category: &Category,
    ) -> Result<bool, StoreError>;

    async fn delete_category(&self, tenant_id: Uuid, category_id: Uuid)
        -> Result<bool, StoreError>;

    // ==================== Items ====================

    async fn insert_item(&self, tenant_id: Uuid, item: &Item) -> Result<(), StoreError>;

    async fn find_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<Option<Item>, StoreError>;

    async fn list_items(&self, tenant_id: Uuid) -> Result<Vec<Item>, StoreError>;

    async fn list_items_for_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<Item>, StoreError>;

    async fn update_item(&self, tenant_id: Uuid, item: &Item) -> Result<bool, StoreError>;

    async fn delete_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<bool, StoreError>;
}

//! In-memory store used by tests and dev mode.
//!
//! Each tenant gets its own partition map; a lookup against a tenant
//! that never saw the record comes back empty, which is exactly the
//! cross-tenant isolation the Postgres store enforces with scoped
//! queries. A single lock per table group keeps every mutation atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AccessToken, BankAccount, Category, Event, EventUser, Item, Role, Tenant, TokenKind, User,
};
use crate::store::{Store, StoreError};

#[derive(Default)]
struct Partition {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    /// Keyed by (event_id, user_id); the value is the single role.
    memberships: HashMap<(Uuid, Uuid), Role>,
    tokens: HashMap<Uuid, AccessToken>,
    bank_accounts: HashMap<Uuid, BankAccount>,
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, Item>,
}

#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<Vec<Tenant>>,
    partitions: RwLock<HashMap<Uuid, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, tenant_id: Uuid, f: impl FnOnce(&Partition) -> T) -> T {
        let partitions = self.partitions.read().expect("store lock poisoned");
        match partitions.get(&tenant_id) {
            Some(partition) => f(partition),
            None => f(&Partition::default()),
        }
    }

    fn write<T>(&self, tenant_id: Uuid, f: impl FnOnce(&mut Partition) -> T) -> T {
        let mut partitions = self.partitions.write().expect("store lock poisoned");
        f(partitions.entry(tenant_id).or_default())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().expect("store lock poisoned");
        Ok(tenants.iter().find(|t| t.domain == domain).cloned())
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), StoreError> {
        let mut tenants = self.tenants.write().expect("store lock poisoned");
        if tenants.iter().any(|t| t.domain == tenant.domain) {
            return Err(StoreError::Duplicate);
        }
        tenants.push(tenant.clone());
        Ok(())
    }

    async fn insert_user(&self, tenant_id: Uuid, user: &User) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            if p.users.values().any(|u| u.email == user.email) {
                return Err(StoreError::Duplicate);
            }
            p.users.insert(user.user_id, user.clone());
            Ok(())
        })
    }

    async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read(tenant_id, |p| p.users.get(&user_id).cloned()))
    }

    async fn find_user_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.users.values().find(|u| u.email == email).cloned()
        }))
    }

    async fn list_users(&self, tenant_id: Uuid) -> Result<Vec<User>, StoreError> {
        Ok(self.read(tenant_id, |p| p.users.values().cloned().collect()))
    }

    async fn update_user(&self, tenant_id: Uuid, user: &User) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            if let Some(existing) = p.users.get_mut(&user.user_id) {
                *existing = user.clone();
                true
            } else {
                false
            }
        }))
    }

    async fn insert_event(&self, tenant_id: Uuid, event: &Event) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            p.events.insert(event.event_id, event.clone());
        });
        Ok(())
    }

    async fn find_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Event>, StoreError> {
        Ok(self.read(tenant_id, |p| p.events.get(&event_id).cloned()))
    }

    async fn list_events(&self, tenant_id: Uuid) -> Result<Vec<Event>, StoreError> {
        Ok(self.read(tenant_id, |p| p.events.values().cloned().collect()))
    }

    async fn update_event(&self, tenant_id: Uuid, event: &Event) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            if let Some(existing) = p.events.get_mut(&event.event_id) {
                *existing = event.clone();
                true
            } else {
                false
            }
        }))
    }

    async fn delete_event(&self, tenant_id: Uuid, event_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            p.memberships.retain(|(e, _), _| *e != event_id);
            p.events.remove(&event_id).is_some()
        }))
    }

    async fn find_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<EventUser>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.memberships
                .get(&(event_id, user_id))
                .map(|role| EventUser::new(event_id, user_id, *role))
        }))
    }

    async fn insert_membership(
        &self,
        tenant_id: Uuid,
        membership: &EventUser,
    ) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            let key = (membership.event_id, membership.user_id);
            if p.memberships.contains_key(&key) {
                return Err(StoreError::Duplicate);
            }
            p.memberships.insert(key, membership.role);
            Ok(())
        })
    }

    async fn update_membership_role(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            match p.memberships.get_mut(&(event_id, user_id)) {
                Some(existing) => {
                    *existing = role;
                    true
                }
                None => false,
            }
        }))
    }

    async fn delete_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            p.memberships.remove(&(event_id, user_id)).is_some()
        }))
    }

    async fn list_memberships_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.memberships
                .iter()
                .filter(|((_, u), _)| *u == user_id)
                .map(|((e, u), role)| EventUser::new(*e, *u, *role))
                .collect()
        }))
    }

    async fn list_memberships_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.memberships
                .iter()
                .filter(|((e, _), _)| *e == event_id)
                .map(|((e, u), role)| EventUser::new(*e, *u, *role))
                .collect()
        }))
    }

    async fn insert_token(&self, tenant_id: Uuid, token: &AccessToken) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            p.tokens.insert(token.token_id, token.clone());
        });
        Ok(())
    }

    async fn find_token(
        &self,
        tenant_id: Uuid,
        token_id: Uuid,
    ) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.read(tenant_id, |p| p.tokens.get(&token_id).cloned()))
    }

    async fn delete_token(&self, tenant_id: Uuid, token_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| p.tokens.remove(&token_id).is_some()))
    }

    async fn delete_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        Ok(self.write(tenant_id, |p| {
            let before = p.tokens.len();
            p.tokens.retain(|_, t| t.user_id != user_id);
            (before - p.tokens.len()) as u64
        }))
    }

    async fn list_event_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<AccessToken>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.tokens
                .values()
                .filter(|t| t.user_id == user_id && t.kind == TokenKind::Event)
                .cloned()
                .collect()
        }))
    }

    async fn insert_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            p.bank_accounts.insert(account.account_id, account.clone());
        });
        Ok(())
    }

    async fn find_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<BankAccount>, StoreError> {
        Ok(self.read(tenant_id, |p| p.bank_accounts.get(&account_id).cloned()))
    }

    async fn list_bank_accounts(&self, tenant_id: Uuid) -> Result<Vec<BankAccount>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.bank_accounts.values().cloned().collect()
        }))
    }

    async fn update_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            if let Some(existing) = p.bank_accounts.get_mut(&account.account_id) {
                *existing = account.clone();
                true
            } else {
                false
            }
        }))
    }

    async fn delete_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            for event in p.events.values_mut() {
                if event.bank_account_id == Some(account_id) {
                    event.bank_account_id = None;
                }
            }
            p.bank_accounts.remove(&account_id).is_some()
        }))
    }

    async fn list_events_for_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.events
                .values()
                .filter(|e| e.bank_account_id == Some(account_id))
                .cloned()
                .collect()
        }))
    }

    async fn insert_category(
        &self,
        tenant_id: Uuid,
        category: &Category,
    ) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            p.categories.insert(category.category_id, category.clone());
        });
        Ok(())
    }

    async fn find_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, StoreError> {
        Ok(self.read(tenant_id, |p| p.categories.get(&category_id).cloned()))
    }

    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, StoreError> {
        Ok(self.read(tenant_id, |p| p.categories.values().cloned().collect()))
    }

    async fn list_categories_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<Category>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.categories
                .values()
                .filter(|c| c.event_id == event_id)
                .cloned()
                .collect()
        }))
    }

    async fn update_category(
        &self,
        tenant_id: Uuid,
        category: &Category,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            if let Some(existing) = p.categories.get_mut(&category.category_id) {
                *existing = category.clone();
                true
            } else {
                false
            }
        }))
    }

    async fn delete_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            p.items.retain(|_, i| i.category_id != category_id);
            p.categories.remove(&category_id).is_some()
        }))
    }

    async fn insert_item(&self, tenant_id: Uuid, item: &Item) -> Result<(), StoreError> {
        self.write(tenant_id, |p| {
            p.items.insert(item.item_id, item.clone());
        });
        Ok(())
    }

    async fn find_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<Option<Item>, StoreError> {
        Ok(self.read(tenant_id, |p| p.items.get(&item_id).cloned()))
    }

    async fn list_items(&self, tenant_id: Uuid) -> Result<Vec<Item>, StoreError> {
        Ok(self.read(tenant_id, |p| p.items.values().cloned().collect()))
    }

    async fn list_items_for_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<Item>, StoreError> {
        Ok(self.read(tenant_id, |p| {
            p.items
                .values()
                .filter(|i| i.category_id == category_id)
                .cloned()
                .collect()
        }))
    }

    async fn update_item(&self, tenant_id: Uuid, item: &Item) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| {
            if let Some(existing) = p.items.get_mut(&item.item_id) {
                *existing = item.clone();
                true
            } else {
                false
            }
        }))
    }

    async fn delete_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write(tenant_id, |p| p.items.remove(&item_id).is_some()))
    }
}

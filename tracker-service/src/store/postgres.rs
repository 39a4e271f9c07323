//! PostgreSQL store.
//!
//! Uses sqlx with runtime-checked queries. All tables carry a
//! `tenant_id` column and every statement filters on it, so a record
//! can never be observed through another tenant's partition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{
    AccessToken, Ability, BankAccount, Category, Event, EventUser, Item, Role, Tenant, TokenKind,
    User,
};
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Membership row with the role still in its stored text form.
#[derive(FromRow)]
struct MembershipRow {
    event_id: Uuid,
    user_id: Uuid,
    role: String,
}

impl MembershipRow {
    fn into_membership(self) -> Result<EventUser, StoreError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| StoreError::Database(anyhow::anyhow!("Unknown role: {}", self.role)))?;
        Ok(EventUser::new(self.event_id, self.user_id, role))
    }
}

/// Token row with kind and abilities in their stored text forms.
#[derive(FromRow)]
struct TokenRow {
    token_id: Uuid,
    user_id: Uuid,
    kind: String,
    event_id: Option<Uuid>,
    abilities: Vec<String>,
    token_hash: String,
    created_utc: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self) -> Result<AccessToken, StoreError> {
        let kind = match self.kind.as_str() {
            "user" => TokenKind::User,
            "event" => TokenKind::Event,
            other => {
                return Err(StoreError::Database(anyhow::anyhow!(
                    "Unknown token kind: {}",
                    other
                )));
            }
        };
        let abilities = self
            .abilities
            .iter()
            .map(|a| {
                Ability::parse(a)
                    .ok_or_else(|| StoreError::Database(anyhow::anyhow!("Unknown ability: {}", a)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AccessToken {
            token_id: self.token_id,
            user_id: self.user_id,
            kind,
            event_id: self.event_id,
            abilities,
            token_hash: self.token_hash,
            created_utc: self.created_utc,
        })
    }
}

fn kind_str(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::User => "user",
        TokenKind::Event => "event",
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, StoreError> {
        Ok(sqlx::query_as::<_, Tenant>(
            "SELECT tenant_id, domain, tenant_label, created_utc FROM tenants WHERE domain = $1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (tenant_id, domain, tenant_label, created_utc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (domain) DO NOTHING
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(&tenant.domain)
        .bind(&tenant.tenant_label)
        .bind(tenant.created_utc)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate);
        }
        Ok(())
    }

    async fn insert_user(&self, tenant_id: Uuid, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (tenant_id, user_id, email, password_hash, display_name,
                 is_active, is_admin, pin_code, pin_code_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tenant_id, email) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(&user.pin_code)
        .bind(user.pin_code_utc)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate);
        }
        Ok(())
    }

    async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password_hash, display_name, is_active,
                   is_admin, pin_code, pin_code_utc, created_utc
            FROM users WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_user_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password_hash, display_name, is_active,
                   is_admin, pin_code, pin_code_utc, created_utc
            FROM users WHERE tenant_id = $1 AND email = $2
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_users(&self, tenant_id: Uuid) -> Result<Vec<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password_hash, display_name, is_active,
                   is_admin, pin_code, pin_code_utc, created_utc
            FROM users WHERE tenant_id = $1 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_user(&self, tenant_id: Uuid, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $3, password_hash = $4, display_name = $5,
                is_active = $6, is_admin = $7, pin_code = $8, pin_code_utc = $9
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(&user.pin_code)
        .bind(user.pin_code_utc)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_event(&self, tenant_id: Uuid, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events
                (tenant_id, event_id, event_label, description, bank_account_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant_id)
        .bind(event.event_id)
        .bind(&event.event_label)
        .bind(&event.description)
        .bind(event.bank_account_id)
        .bind(event.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Event>, StoreError> {
        Ok(sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, event_label, description, bank_account_id, created_utc
            FROM events WHERE tenant_id = $1 AND event_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_events(&self, tenant_id: Uuid) -> Result<Vec<Event>, StoreError> {
        Ok(sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, event_label, description, bank_account_id, created_utc
            FROM events WHERE tenant_id = $1 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_event(&self, tenant_id: Uuid, event: &Event) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE events SET event_label = $3, description = $4, bank_account_id = $5
            WHERE tenant_id = $1 AND event_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(event.event_id)
        .bind(&event.event_label)
        .bind(&event.description)
        .bind(event.bank_account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, tenant_id: Uuid, event_id: Uuid) -> Result<bool, StoreError> {
        // Memberships cascade via FK.
        let result = sqlx::query("DELETE FROM events WHERE tenant_id = $1 AND event_id = $2")
            .bind(tenant_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<EventUser>, StoreError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT event_id, user_id, role FROM event_users
            WHERE tenant_id = $1 AND event_id = $2 AND user_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MembershipRow::into_membership).transpose()
    }

    async fn insert_membership(
        &self,
        tenant_id: Uuid,
        membership: &EventUser,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO event_users (tenant_id, event_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, event_id, user_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(membership.event_id)
        .bind(membership.user_id)
        .bind(membership.role.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate);
        }
        Ok(())
    }

    async fn update_membership_role(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE event_users SET role = $4
            WHERE tenant_id = $1 AND event_id = $2 AND user_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(event_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM event_users WHERE tenant_id = $1 AND event_id = $2 AND user_id = $3",
        )
        .bind(tenant_id)
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_memberships_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT event_id, user_id, role FROM event_users WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(MembershipRow::into_membership)
            .collect()
    }

    async fn list_memberships_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<EventUser>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT event_id, user_id, role FROM event_users WHERE tenant_id = $1 AND event_id = $2",
        )
        .bind(tenant_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(MembershipRow::into_membership)
            .collect()
    }

    async fn insert_token(&self, tenant_id: Uuid, token: &AccessToken) -> Result<(), StoreError> {
        let abilities: Vec<String> = token.abilities.iter().map(|a| a.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO access_tokens
                (tenant_id, token_id, user_id, kind, event_id, abilities, token_hash, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(tenant_id)
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(kind_str(token.kind))
        .bind(token.event_id)
        .bind(&abilities)
        .bind(&token.token_hash)
        .bind(token.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_token(
        &self,
        tenant_id: Uuid,
        token_id: Uuid,
    ) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token_id, user_id, kind, event_id, abilities, token_hash, created_utc
            FROM access_tokens WHERE tenant_id = $1 AND token_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TokenRow::into_token).transpose()
    }

    async fn delete_token(&self, tenant_id: Uuid, token_id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM access_tokens WHERE tenant_id = $1 AND token_id = $2")
                .bind(tenant_id)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_event_tokens_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<AccessToken>, StoreError> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token_id, user_id, kind, event_id, abilities, token_hash, created_utc
            FROM access_tokens
            WHERE tenant_id = $1 AND user_id = $2 AND kind = 'event'
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TokenRow::into_token).collect()
    }

    async fn insert_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bank_accounts
                (tenant_id, account_id, account_label, iban, balance_cents, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant_id)
        .bind(account.account_id)
        .bind(&account.account_label)
        .bind(&account.iban)
        .bind(account.balance_cents)
        .bind(account.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<BankAccount>, StoreError> {
        Ok(sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT account_id, account_label, iban, balance_cents, created_utc
            FROM bank_accounts WHERE tenant_id = $1 AND account_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_bank_accounts(&self, tenant_id: Uuid) -> Result<Vec<BankAccount>, StoreError> {
        Ok(sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT account_id, account_label, iban, balance_cents, created_utc
            FROM bank_accounts WHERE tenant_id = $1 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_bank_account(
        &self,
        tenant_id: Uuid,
        account: &BankAccount,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE bank_accounts SET account_label = $3, iban = $4, balance_cents = $5
            WHERE tenant_id = $1 AND account_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(account.account_id)
        .bind(&account.account_label)
        .bind(&account.iban)
        .bind(account.balance_cents)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<bool, StoreError> {
        // Linked events keep existing; their account reference nulls via FK.
        let result = sqlx::query("DELETE FROM bank_accounts WHERE tenant_id = $1 AND account_id = $2")
            .bind(tenant_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_events_for_bank_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, event_label, description, bank_account_id, created_utc
            FROM events WHERE tenant_id = $1 AND bank_account_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_category(
        &self,
        tenant_id: Uuid,
        category: &Category,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO categories (tenant_id, category_id, event_id, category_label, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tenant_id)
        .bind(category.category_id)
        .bind(category.event_id)
        .bind(&category.category_label)
        .bind(category.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, StoreError> {
        Ok(sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, event_id, category_label, created_utc
            FROM categories WHERE tenant_id = $1 AND category_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, StoreError> {
        Ok(sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, event_id, category_label, created_utc
            FROM categories WHERE tenant_id = $1 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_categories_for_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<Category>, StoreError> {
        Ok(sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, event_id, category_label, created_utc
            FROM categories WHERE tenant_id = $1 AND event_id = $2 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_category(
        &self,
        tenant_id: Uuid,
        category: &Category,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET category_label = $3
            WHERE tenant_id = $1 AND category_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(category.category_id)
        .bind(&category.category_label)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, StoreError> {
        // Items cascade via FK.
        let result = sqlx::query("DELETE FROM categories WHERE tenant_id = $1 AND category_id = $2")
            .bind(tenant_id)
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_item(&self, tenant_id: Uuid, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (tenant_id, item_id, category_id, item_label, amount_cents, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant_id)
        .bind(item.item_id)
        .bind(item.category_id)
        .bind(&item.item_label)
        .bind(item.amount_cents)
        .bind(item.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<Option<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, category_id, item_label, amount_cents, created_utc
            FROM items WHERE tenant_id = $1 AND item_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_items(&self, tenant_id: Uuid) -> Result<Vec<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, category_id, item_label, amount_cents, created_utc
            FROM items WHERE tenant_id = $1 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_items_for_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, category_id, item_label, amount_cents, created_utc
            FROM items WHERE tenant_id = $1 AND category_id = $2 ORDER BY created_utc
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_item(&self, tenant_id: Uuid, item: &Item) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET item_label = $3, amount_cents = $4
            WHERE tenant_id = $1 AND item_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(item.item_id)
        .bind(&item.item_label)
        .bind(item.amount_cents)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE tenant_id = $1 AND item_id = $2")
            .bind(tenant_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

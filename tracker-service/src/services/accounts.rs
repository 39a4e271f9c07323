//! Account lifecycle: registration, login, activation and PIN resets.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Ability, IssuedToken, User};
use crate::services::{ServiceError, TokenService};
use crate::store::{Store, StoreError};
use crate::utils::{Password, PasswordHashString, hash_password, verify_password};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Register a new active, non-admin user.
    pub async fn register(
        &self,
        tenant_id: Uuid,
        email: String,
        password: String,
        display_name: Option<String>,
    ) -> Result<User, ServiceError> {
        let password_hash = hash_password(&Password::new(password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(email, password_hash.into_string(), display_name);
        match self.store.insert_user(tenant_id, &user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.user_id, "User registered");
                Ok(user)
            }
            Err(StoreError::Duplicate) => Err(ServiceError::EmailAlreadyRegistered),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and issue a user token.
    ///
    /// Admins get the wildcard ability; everyone else gets `write` and
    /// `self`. Wrong email, wrong password and an inactive account all
    /// surface as the same collapsed failure.
    pub async fn login(
        &self,
        tenant_id: Uuid,
        email: &str,
        password: String,
    ) -> Result<(User, IssuedToken), ServiceError> {
        let user = self
            .store
            .find_user_by_email(tenant_id, email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        if !user.is_active {
            return Err(ServiceError::UserInactive);
        }

        let abilities = if user.is_admin {
            vec![Ability::Wildcard]
        } else {
            vec![Ability::Write, Ability::SelfScoped]
        };
        let token = self
            .tokens
            .issue_user_token(tenant_id, &user, abilities)
            .await?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok((user, token))
    }

    /// Seed a new unprivileged user from an authenticated route.
    pub async fn seed(
        &self,
        tenant_id: Uuid,
        email: String,
        password: String,
        display_name: Option<String>,
    ) -> Result<User, ServiceError> {
        self.register(tenant_id, email, password, display_name).await
    }

    /// Flip the active flag. Deactivation revokes every outstanding
    /// token immediately.
    pub async fn toggle_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<User, ServiceError> {
        let mut user = self
            .store
            .find_user(tenant_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        user.is_active = !user.is_active;
        self.store.update_user(tenant_id, &user).await?;

        if !user.is_active {
            self.tokens.revoke_all(tenant_id, user_id).await?;
        }

        tracing::info!(user_id = %user_id, is_active = user.is_active, "User active flag toggled");

        Ok(user)
    }

    /// Deactivate without toggling. Used for the soft delete route;
    /// users are never hard-deleted.
    pub async fn deactivate(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user(tenant_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if user.is_active {
            user.is_active = false;
            self.store.update_user(tenant_id, &user).await?;
        }
        self.tokens.revoke_all(tenant_id, user_id).await?;

        tracing::info!(user_id = %user_id, "User deactivated");

        Ok(())
    }

    /// Store a new PIN challenge for the user.
    ///
    /// A PIN reset is the recovery path for compromised credentials, so
    /// it runs the same revocation as deactivation: every outstanding
    /// token dies with it.
    pub async fn set_pin_code(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        pin_code: String,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user(tenant_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        user.pin_code = Some(pin_code);
        user.pin_code_utc = Some(Utc::now());
        self.store.update_user(tenant_id, &user).await?;

        self.tokens.revoke_all(tenant_id, user_id).await?;

        tracing::info!(user_id = %user_id, "PIN code updated, tokens revoked");

        Ok(())
    }

    /// Update profile fields.
    pub async fn update_profile(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        display_name: Option<String>,
    ) -> Result<User, ServiceError> {
        let mut user = self
            .store
            .find_user(tenant_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if display_name.is_some() {
            user.display_name = display_name;
        }
        self.store.update_user(tenant_id, &user).await?;

        Ok(user)
    }
}

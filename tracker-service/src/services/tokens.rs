//! Token issuance and validation.
//!
//! Secrets come from the OS random source, are stored only as SHA-256
//! digests and compared in constant time. Validation rebuilds the
//! identity from current stored state on every call: abilities come
//! from the token record, the event role from a fresh membership
//! lookup, and the owning user's active flag is re-checked. Nothing a
//! token carries survives a change in the data it was derived from.

use std::sync::Arc;

use rand::RngCore;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::models::{
    AccessToken, Ability, IssuedToken, TokenKind, TokenSetResponse, User, split_credential,
};
use crate::services::{IdentityContext, RoleResolver, ServiceError};
use crate::store::Store;

/// Bytes of randomness behind each plaintext secret.
const SECRET_LEN: usize = 40;

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    roles: RoleResolver,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>, roles: RoleResolver) -> Self {
        Self { store, roles }
    }

    /// Issue a long-lived user token carrying a static ability set.
    /// The returned credential is the only copy of the plaintext.
    pub async fn issue_user_token(
        &self,
        tenant_id: Uuid,
        user: &User,
        abilities: Vec<Ability>,
    ) -> Result<IssuedToken, ServiceError> {
        let plaintext = generate_secret();
        let record = AccessToken::new_user_token(user.user_id, abilities, &plaintext);
        self.store.insert_token(tenant_id, &record).await?;

        tracing::info!(user_id = %user.user_id, token_id = %record.token_id, "User token issued");

        Ok(IssuedToken::new(record, plaintext))
    }

    /// Issue an event token for a (user, event) pair. No ability set is
    /// stored; the role is resolved live on every validation.
    pub async fn issue_event_token(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<IssuedToken, ServiceError> {
        let plaintext = generate_secret();
        let record = AccessToken::new_event_token(user_id, event_id, &plaintext);
        self.store.insert_token(tenant_id, &record).await?;

        tracing::info!(
            user_id = %user_id,
            event_id = %event_id,
            token_id = %record.token_id,
            "Event token issued"
        );

        Ok(IssuedToken::new(record, plaintext))
    }

    /// Validate a bearer credential against the tenant's partition and
    /// rebuild the identity from current stored state.
    ///
    /// A credential from another tenant misses the token lookup even if
    /// ids coincide, because the lookup itself is tenant-scoped. An
    /// event token whose membership row is gone fails here: the
    /// membership's deletion is the revocation.
    pub async fn validate(
        &self,
        tenant_id: Uuid,
        credential: &str,
    ) -> Result<IdentityContext, ServiceError> {
        let (token_id, secret) =
            split_credential(credential).ok_or(ServiceError::InvalidToken)?;

        let record = self
            .store
            .find_token(tenant_id, token_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        // Both sides are fixed-length hex digests; compare without
        // short-circuiting to avoid a timing oracle.
        let presented = AccessToken::hash_secret(secret);
        if presented
            .as_bytes()
            .ct_eq(record.token_hash.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(ServiceError::InvalidToken);
        }

        let user = self
            .store
            .find_user(tenant_id, record.user_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;
        if !user.is_active {
            return Err(ServiceError::UserInactive);
        }

        let role = match (record.kind, record.event_id) {
            (TokenKind::Event, Some(event_id)) => {
                let role = self.roles.role_of(tenant_id, user.user_id, event_id).await?;
                if role.is_none() {
                    // Membership gone: the token died with it.
                    return Err(ServiceError::InvalidToken);
                }
                role
            }
            (TokenKind::Event, None) => return Err(ServiceError::InvalidToken),
            (TokenKind::User, _) => None,
        };

        Ok(IdentityContext {
            tenant_id,
            token_id: record.token_id,
            user_id: user.user_id,
            kind: record.kind,
            is_admin: user.is_admin,
            abilities: record.abilities,
            event_id: record.event_id,
            role,
        })
    }

    /// Invalidate every stored token of the user, both kinds. Called
    /// when the active flag flips off and on PIN reset.
    pub async fn revoke_all(&self, tenant_id: Uuid, user_id: Uuid) -> Result<u64, ServiceError> {
        let revoked = self.store.delete_tokens_for_user(tenant_id, user_id).await?;
        if revoked > 0 {
            tracing::info!(user_id = %user_id, revoked, "Revoked all tokens for user");
        }
        Ok(revoked)
    }

    /// Reconcile the user's event tokens against current memberships
    /// and the set of token ids the client reports holding.
    ///
    /// A stored token survives only while its membership exists and the
    /// client still holds it; everything else is dropped, and every
    /// membership left uncovered gets a fresh token. The response is
    /// the authoritative set for the client to persist. Idempotent: a
    /// second call reporting that set issues nothing.
    pub async fn sync(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        client_tokens: &[Uuid],
    ) -> Result<TokenSetResponse, ServiceError> {
        let memberships = self
            .store
            .list_memberships_for_user(tenant_id, user_id)
            .await?;
        let existing = self
            .store
            .list_event_tokens_for_user(tenant_id, user_id)
            .await?;

        let mut live: Vec<Uuid> = Vec::new();
        for token in &existing {
            let membership_alive = token
                .event_id
                .map(|e| memberships.iter().any(|m| m.event_id == e))
                .unwrap_or(false);
            if membership_alive && client_tokens.contains(&token.token_id) {
                live.push(token.token_id);
            } else {
                self.store.delete_token(tenant_id, token.token_id).await?;
            }
        }

        // Issue tokens for memberships that lack one.
        let mut issued = Vec::new();
        for membership in &memberships {
            let covered = existing
                .iter()
                .any(|t| t.event_id == Some(membership.event_id) && live.contains(&t.token_id));
            if !covered {
                let token = self
                    .issue_event_token(tenant_id, user_id, membership.event_id)
                    .await?;
                live.push(token.record.token_id);
                issued.push(token.credential);
            }
        }

        Ok(TokenSetResponse {
            tokens: live,
            issued,
        })
    }

    /// Drop server-side event tokens the client no longer needs, ahead
    /// of a sync: tokens whose membership is gone, and tokens the
    /// client reports it no longer holds. Ids that are already gone are
    /// a no-op, not an error.
    pub async fn purge(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        client_tokens: &[Uuid],
    ) -> Result<u64, ServiceError> {
        let stored = self
            .store
            .list_event_tokens_for_user(tenant_id, user_id)
            .await?;
        let mut purged = 0;
        for token in stored {
            let membership_alive = match token.event_id {
                Some(event_id) => self
                    .store
                    .find_membership(tenant_id, event_id, user_id)
                    .await?
                    .is_some(),
                None => false,
            };
            let still_held = client_tokens.contains(&token.token_id);
            if !membership_alive || !still_held {
                if self.store.delete_token(tenant_id, token.token_id).await? {
                    purged += 1;
                }
            }
        }
        Ok(purged)
    }
}

/// High-entropy plaintext secret, hex-encoded for transport.
fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_long_and_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), SECRET_LEN * 2);
        assert_ne!(a, b);
    }
}

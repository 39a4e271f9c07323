//! Access token model - the stored half of a bearer credential.
//!
//! Both token kinds share one storage shape. The plaintext secret is
//! never persisted: only its SHA-256 digest is, and the full credential
//! `"<token_id>|<plaintext>"` is handed to the client exactly once at
//! issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A static capability carried by a user token.
///
/// Closed enum on purpose: route declarations and stored ability sets
/// both go through [`Ability::parse`], so a misspelt capability fails
/// loudly instead of silently never matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    /// `*` - grants everything, equivalent to the admin flag.
    #[serde(rename = "*")]
    Wildcard,
    /// General read/write access for user-token routes.
    #[serde(rename = "write")]
    Write,
    /// Access limited to resources owned by the acting user itself.
    #[serde(rename = "self")]
    SelfScoped,
    /// Elevated per-event role, resolved live from membership.
    #[serde(rename = "manager")]
    Manager,
}

impl Ability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::Wildcard => "*",
            Ability::Write => "write",
            Ability::SelfScoped => "self",
            Ability::Manager => "manager",
        }
    }

    pub fn parse(s: &str) -> Option<Ability> {
        match s {
            "*" => Some(Ability::Wildcard),
            "write" => Some(Ability::Write),
            "self" => Some(Ability::SelfScoped),
            "manager" => Some(Ability::Manager),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminates the two token kinds sharing one storage shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Long-lived, ability-scoped, bound to a user.
    User,
    /// Bound to a (user, event) pair; its effective permission is the
    /// user's current role on that event, re-derived on every use.
    Event,
}

/// Stored access token record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub kind: TokenKind,
    /// Set for event tokens only.
    pub event_id: Option<Uuid>,
    /// Static ability set; empty for event tokens.
    pub abilities: Vec<Ability>,
    /// Hex SHA-256 of the plaintext secret.
    pub token_hash: String,
    pub created_utc: DateTime<Utc>,
}

impl AccessToken {
    /// Build a user-token record from a plaintext secret.
    pub fn new_user_token(user_id: Uuid, abilities: Vec<Ability>, plaintext: &str) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            user_id,
            kind: TokenKind::User,
            event_id: None,
            abilities,
            token_hash: Self::hash_secret(plaintext),
            created_utc: Utc::now(),
        }
    }

    /// Build an event-token record from a plaintext secret. No ability
    /// set is baked in; the role is looked up at validation time.
    pub fn new_event_token(user_id: Uuid, event_id: Uuid, plaintext: &str) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            user_id,
            kind: TokenKind::Event,
            event_id: Some(event_id),
            abilities: Vec::new(),
            token_hash: Self::hash_secret(plaintext),
            created_utc: Utc::now(),
        }
    }

    /// One-way digest of a plaintext secret.
    pub fn hash_secret(plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }
}

/// A freshly issued token: the stored record plus the full bearer
/// credential. The credential exists only in this value and in the
/// response that carries it to the client.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: AccessToken,
    pub credential: String,
}

impl IssuedToken {
    pub fn new(record: AccessToken, plaintext: String) -> Self {
        let credential = format!("{}|{}", record.token_id, plaintext);
        Self { record, credential }
    }
}

/// Split a bearer credential into its record id and plaintext secret.
/// The split happens on the first `|` so the secret may contain more.
pub fn split_credential(credential: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = credential.split_once('|')?;
    let token_id = Uuid::parse_str(id).ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((token_id, secret))
}

/// Client token set for the sync/purge endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenSetRequest {
    /// Token record ids the client currently holds.
    pub tokens: Vec<Uuid>,
}

/// Authoritative server-side token set returned from sync.
#[derive(Debug, Serialize)]
pub struct TokenSetResponse {
    /// Record ids of every live event token after reconciliation.
    pub tokens: Vec<Uuid>,
    /// Full credentials for tokens issued during this sync; the client
    /// must persist these, they are never returned again.
    pub issued: Vec<String>,
}

/// Token response after login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_round_trip() {
        for ability in [
            Ability::Wildcard,
            Ability::Write,
            Ability::SelfScoped,
            Ability::Manager,
        ] {
            assert_eq!(Ability::parse(ability.as_str()), Some(ability));
        }
    }

    #[test]
    fn test_ability_rejects_unknown() {
        assert_eq!(Ability::parse("writer"), None);
        assert_eq!(Ability::parse("Self"), None);
        assert_eq!(Ability::parse(""), None);
    }

    #[test]
    fn test_split_credential() {
        let id = Uuid::new_v4();
        let cred = format!("{}|abc|def", id);
        let (parsed_id, secret) = split_credential(&cred).unwrap();
        assert_eq!(parsed_id, id);
        // Only the first delimiter splits; the rest is secret.
        assert_eq!(secret, "abc|def");
    }

    #[test]
    fn test_split_credential_rejects_malformed() {
        assert!(split_credential("no-delimiter").is_none());
        assert!(split_credential("not-a-uuid|secret").is_none());
        assert!(split_credential(&format!("{}|", Uuid::new_v4())).is_none());
    }

    #[test]
    fn test_hash_is_stable_and_one_way() {
        let digest = AccessToken::hash_secret("secret");
        assert_eq!(digest, AccessToken::hash_secret("secret"));
        assert_ne!(digest, AccessToken::hash_secret("Secret"));
        assert_eq!(digest.len(), 64);
    }
}

//! User model - tenant-scoped identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// User entity (tenant-scoped).
///
/// Ids are random UUIDs, never sequential, so they are safe to expose
/// to clients. Users are only ever soft-deactivated; deactivation
/// immediately invalidates every outstanding token.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    /// Secondary-verification challenge, set via the PIN endpoint.
    pub pin_code: Option<String>,
    pub pin_code_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new active, non-admin user.
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            display_name,
            is_active: true,
            is_admin: false,
            pin_code: None,
            pin_code_utc: None,
            created_utc: Utc::now(),
        }
    }

    /// Convert to sanitized response (no credential or flag fields).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// Request to register a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub display_name: Option<String>,
}

/// Request to login with email/password.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to update a user's PIN code.
#[derive(Debug, Deserialize, Validate)]
pub struct PinCodeRequest {
    #[validate(length(min = 4, max = 8))]
    pub pin_code: String,
}

/// Request to update profile fields.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
}

/// User response for API. Credential hash, admin/active flags and PIN
/// state are deliberately absent, mirroring what clients may see.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            display_name: u.display_name,
            created_utc: u.created_utc,
        }
    }
}

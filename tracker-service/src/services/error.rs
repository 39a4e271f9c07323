use service_core::error::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Failures of the access-control core and the services built on it.
/// All of them are terminal for the current request; nothing is retried
/// internally.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    /// No tenant is registered for the request's domain.
    #[error("No such tenant")]
    NoSuchTenant,

    /// Credential failed to parse, hash-compare, or resolve.
    #[error("Invalid token")]
    InvalidToken,

    /// The token's owning user has been deactivated.
    #[error("User inactive")]
    UserInactive,

    /// Login with wrong email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Ability gate deny.
    #[error("Unauthorized")]
    Unauthorized,

    /// A membership already exists for the (event, user) pair.
    #[error("Duplicate membership")]
    DuplicateMembership,

    /// No membership exists for the (event, user) pair.
    #[error("Membership not found")]
    MembershipNotFound,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// Tenant-scoped resource lookup missed.
    #[error("Not found")]
    NotFound,

    /// Unique-constraint violation without a more specific meaning.
    #[error("Conflict")]
    Conflict,
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ServiceError::Conflict,
            StoreError::Database(e) => ServiceError::Database(e),
        }
    }
}

/// Handlers read through the store directly; a raw store failure maps
/// the same way it would through a service.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            // Authentication failures collapse into one response so the
            // caller cannot probe for account state.
            ServiceError::InvalidToken
            | ServiceError::UserInactive
            | ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            // Gate denials, unknown tenants and missed lookups all get
            // the same body: existence of a resource in another tenant
            // must not be observable.
            ServiceError::NoSuchTenant
            | ServiceError::Unauthorized
            | ServiceError::NotFound => AppError::NotFound(anyhow::anyhow!("Not found")),
            ServiceError::DuplicateMembership => {
                AppError::Conflict(anyhow::anyhow!("Membership already exists"))
            }
            ServiceError::MembershipNotFound => {
                AppError::NotFound(anyhow::anyhow!("Not found"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::Conflict => AppError::Conflict(anyhow::anyhow!("Conflict")),
        }
    }
}

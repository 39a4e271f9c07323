pub mod ability;
pub mod auth;
pub mod json;
pub mod tenant;

pub use ability::require_abilities;
pub use auth::{auth_middleware, AuthUser};
pub use json::Json;
pub use tenant::{tenant_middleware, CurrentTenant};

pub mod accounts;
pub mod error;
pub mod gate;
pub mod membership;
pub mod roles;
pub mod tenancy;
pub mod tokens;

pub use accounts::AccountService;
pub use error::ServiceError;
pub use gate::{IdentityContext, Target, authorize};
pub use membership::MembershipService;
pub use roles::RoleResolver;
pub use tenancy::{TenantContext, TenantDirectory};
pub use tokens::TokenService;

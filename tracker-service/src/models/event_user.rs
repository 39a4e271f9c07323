//! Event-user membership model - the (event, user, role) pivot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a user holds on a specific event.
///
/// A closed enum rather than free-form strings so a typo can never
/// silently grant or withhold access. `Manager` is the elevated role
/// the ability gate recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Contributor,
    Basic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Contributor => "contributor",
            Role::Basic => "basic",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "manager" => Some(Role::Manager),
            "contributor" => Some(Role::Contributor),
            "basic" => Some(Role::Basic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership entity: at most one row per (event, user) pair.
///
/// A membership cannot outlive its event or user; deleting it lazily
/// invalidates any event token issued against the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventUser {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

impl EventUser {
    pub fn new(event_id: Uuid, user_id: Uuid, role: Role) -> Self {
        Self {
            event_id,
            user_id,
            role,
        }
    }
}

/// Request to attach a user to an event.
#[derive(Debug, Deserialize)]
pub struct AttachUserRequest {
    pub user_id: Uuid,
    pub role: Role,
}

/// Request to change a member's role.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Manager, Role::Contributor, Role::Basic] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert_eq!(Role::parse("Manager"), None);
        assert_eq!(Role::parse("owner"), None);
        assert_eq!(Role::parse(""), None);
    }
}

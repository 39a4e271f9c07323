//! Ability gate - the single enforcement point.
//!
//! Every protected operation declares a required ability list; the gate
//! decides from the resolved identity context alone. The decision is a
//! pure function of the context and the target, which keeps it trivial
//! to test and impossible to bypass with stale cached state: anything
//! live (the event role) was already resolved into the context during
//! token validation, within the same request.

use uuid::Uuid;

use crate::models::{Ability, Role, TokenKind};
use crate::services::ServiceError;

/// Identity resolved from a validated bearer credential.
///
/// For user tokens the ability set is the one stored with the token.
/// For event tokens `role` carries the membership role looked up fresh
/// at validation time; it is never baked into the credential.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub tenant_id: Uuid,
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub is_admin: bool,
    pub abilities: Vec<Ability>,
    /// Bound event, event tokens only.
    pub event_id: Option<Uuid>,
    /// Live role on the bound event, event tokens only.
    pub role: Option<Role>,
}

/// What the operation is aimed at, for the target-sensitive abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// No particular resource (index routes and similar).
    Any,
    /// A resource owned by the given user; `self` compares against it.
    OwnUser(Uuid),
    /// A specific event; `manager` must hold on exactly this event.
    Event(Uuid),
}

/// Check a required ability list (a disjunction) against an identity.
///
/// Rules:
/// - wildcard ability or the admin flag always allows;
/// - `write` is satisfied by a user token carrying `write`;
/// - `self` is satisfied only when the target's owning user is the
///   acting user and the token carries `self`;
/// - `manager` is satisfied by an event token whose live role is
///   manager, on the targeted event when one is named;
/// - anything else denies.
pub fn authorize(
    ctx: &IdentityContext,
    required: &[Ability],
    target: Target,
) -> Result<(), ServiceError> {
    if ctx.is_admin || ctx.abilities.contains(&Ability::Wildcard) {
        return Ok(());
    }

    for ability in required {
        let satisfied = match ability {
            // Only the blanket rule above grants the wildcard.
            Ability::Wildcard => false,
            Ability::Write => {
                ctx.kind == TokenKind::User && ctx.abilities.contains(&Ability::Write)
            }
            Ability::SelfScoped => {
                ctx.kind == TokenKind::User
                    && ctx.abilities.contains(&Ability::SelfScoped)
                    && matches!(target, Target::OwnUser(owner) if owner == ctx.user_id)
            }
            Ability::Manager => {
                ctx.kind == TokenKind::Event
                    && ctx.role == Some(Role::Manager)
                    && match target {
                        Target::Event(event_id) => ctx.event_id == Some(event_id),
                        _ => true,
                    }
            }
        };
        if satisfied {
            return Ok(());
        }
    }

    Err(ServiceError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_ctx(abilities: Vec<Ability>) -> IdentityContext {
        IdentityContext {
            tenant_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: TokenKind::User,
            is_admin: false,
            abilities,
            event_id: None,
            role: None,
        }
    }

    fn event_ctx(event_id: Uuid, role: Option<Role>) -> IdentityContext {
        IdentityContext {
            tenant_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: TokenKind::Event,
            is_admin: false,
            abilities: Vec::new(),
            event_id: Some(event_id),
            role,
        }
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let ctx = user_ctx(vec![Ability::Wildcard]);
        assert!(authorize(&ctx, &[Ability::Manager], Target::Any).is_ok());
        assert!(authorize(&ctx, &[], Target::Any).is_ok());
    }

    #[test]
    fn test_admin_flag_allows_everything() {
        let mut ctx = user_ctx(vec![]);
        ctx.is_admin = true;
        assert!(authorize(&ctx, &[Ability::Manager], Target::Any).is_ok());
    }

    #[test]
    fn test_required_list_is_a_disjunction() {
        let ctx = user_ctx(vec![Ability::Write]);
        assert!(authorize(&ctx, &[Ability::Wildcard, Ability::Write], Target::Any).is_ok());
    }

    #[test]
    fn test_write_token_denied_manager_only_route() {
        let ctx = user_ctx(vec![Ability::Write]);
        assert!(matches!(
            authorize(&ctx, &[Ability::Manager], Target::Any),
            Err(ServiceError::Unauthorized)
        ));
    }

    #[test]
    fn test_self_requires_matching_owner() {
        let ctx = user_ctx(vec![Ability::SelfScoped]);
        assert!(authorize(&ctx, &[Ability::SelfScoped], Target::OwnUser(ctx.user_id)).is_ok());
        assert!(
            authorize(&ctx, &[Ability::SelfScoped], Target::OwnUser(Uuid::new_v4())).is_err()
        );
        assert!(authorize(&ctx, &[Ability::SelfScoped], Target::Any).is_err());
    }

    #[test]
    fn test_manager_requires_live_manager_role() {
        let event = Uuid::new_v4();
        let ctx = event_ctx(event, Some(Role::Manager));
        assert!(authorize(&ctx, &[Ability::Manager], Target::Event(event)).is_ok());

        let contributor = event_ctx(event, Some(Role::Contributor));
        assert!(authorize(&contributor, &[Ability::Manager], Target::Event(event)).is_err());

        let no_role = event_ctx(event, None);
        assert!(authorize(&no_role, &[Ability::Manager], Target::Event(event)).is_err());
    }

    #[test]
    fn test_manager_bound_to_its_event() {
        let event = Uuid::new_v4();
        let ctx = event_ctx(event, Some(Role::Manager));
        assert!(authorize(&ctx, &[Ability::Manager], Target::Event(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_event_token_never_satisfies_write() {
        let ctx = event_ctx(Uuid::new_v4(), Some(Role::Manager));
        assert!(authorize(&ctx, &[Ability::Write], Target::Any).is_err());
    }

    #[test]
    fn test_default_deny() {
        let ctx = user_ctx(vec![]);
        assert!(authorize(&ctx, &[Ability::Write], Target::Any).is_err());
        assert!(authorize(&ctx, &[], Target::Any).is_err());
    }
}

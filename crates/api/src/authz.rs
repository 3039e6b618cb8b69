//! The two authorization checks every mutating route composes.
//!
//! Role gating and ownership are deliberately separate, independently
//! testable functions rather than per-handler conditionals. Role matching is
//! by non-empty intersection; ownership admits the resource owner and any
//! privileged (ADMIN/`SUPER_ADMIN`) caller.

use tradepost_core::{Role, UserId};

use crate::error::AppError;
use crate::middleware::CurrentUser;

/// Pass when the caller holds ANY of the required roles.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the caller's role set does not
/// intersect `required`.
pub fn require_any_role(user: &CurrentUser, required: &[Role]) -> Result<(), AppError> {
    if user.roles.intersects(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_owned(),
        ))
    }
}

/// Pass when the caller owns the resource, or holds moderation privileges.
///
/// Admins bypass the ownership check: the routes that enforce ownership also
/// admit ADMIN/`SUPER_ADMIN` through their role gate, and that admission
/// would be dead if strict owner equality were applied to them.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for a non-owner without privileges.
pub fn require_owner_or_admin(user: &CurrentUser, owner: UserId) -> Result<(), AppError> {
    if user.id == owner || user.roles.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not own this resource".to_owned(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tradepost_core::RoleSet;

    fn user_with(roles: &[Role]) -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            roles: RoleSet::from_roles(roles.iter().copied()).unwrap(),
        }
    }

    #[test]
    fn test_intersection_grants_access() {
        // {SELLER, ADMIN} passes a route requiring {ADMIN} alone
        let user = user_with(&[Role::Seller, Role::Admin]);
        assert!(require_any_role(&user, &[Role::Admin]).is_ok());
    }

    #[test]
    fn test_disjoint_roles_are_forbidden() {
        let user = user_with(&[Role::Seller]);
        let err = require_any_role(&user, &[Role::Admin, Role::SuperAdmin]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_empty_requirement_is_forbidden() {
        // No route requires nothing; an empty set can never intersect.
        let user = user_with(&[Role::SuperAdmin]);
        assert!(require_any_role(&user, &[]).is_err());
    }

    #[test]
    fn test_owner_passes_ownership() {
        let user = user_with(&[Role::Seller]);
        assert!(require_owner_or_admin(&user, user.id).is_ok());
    }

    #[test]
    fn test_non_owner_seller_is_forbidden() {
        let user = user_with(&[Role::Seller]);
        let err = require_owner_or_admin(&user, UserId::generate()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let admin = user_with(&[Role::Admin]);
        assert!(require_owner_or_admin(&admin, UserId::generate()).is_ok());

        let super_admin = user_with(&[Role::SuperAdmin]);
        assert!(require_owner_or_admin(&super_admin, UserId::generate()).is_ok());
    }
}

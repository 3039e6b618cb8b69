//! User roles and role sets.
//!
//! A user holds one or more roles; routes declare which roles they require
//! and access is granted on a non-empty intersection, never on exact
//! equality. The [`RoleSet`] type also carries the "never empty" invariant.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A capability label attached to a user.
///
/// Roles are non-exclusive: a user may hold several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May create and manage their own listings.
    Seller,
    /// May moderate the catalog (approve/reject) and view unfiltered dumps.
    Admin,
    /// May additionally grant and revoke the admin role.
    SuperAdmin,
}

/// Error parsing a [`Role`] from its string form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

impl Role {
    /// The stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "SELLER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Whether this role carries moderation privileges.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELLER" => Ok(Self::Seller),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(RoleError(other.to_owned())),
        }
    }
}

/// Errors that can occur when manipulating a [`RoleSet`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleSetError {
    /// A role set must always contain at least one role.
    #[error("a user must hold at least one role")]
    Empty,
    /// A stored role string could not be parsed.
    #[error(transparent)]
    UnknownRole(#[from] RoleError),
}

/// A non-empty, duplicate-free set of roles.
///
/// Insertion order is preserved so serialized output is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// The role set every registered seller starts with.
    #[must_use]
    pub fn seller() -> Self {
        Self(vec![Role::Seller])
    }

    /// Build a role set from a list of roles, dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`RoleSetError::Empty`] if no roles are given.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Result<Self, RoleSetError> {
        let mut set = Vec::new();
        for role in roles {
            if !set.contains(&role) {
                set.push(role);
            }
        }
        if set.is_empty() {
            return Err(RoleSetError::Empty);
        }
        Ok(Self(set))
    }

    /// Parse a role set from stored string form (a `TEXT[]` column).
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown role string or an empty list.
    pub fn parse(strings: &[String]) -> Result<Self, RoleSetError> {
        let roles = strings
            .iter()
            .map(|s| s.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_roles(roles)
    }

    /// Whether the set contains the given role.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether any of `required` is held — the route-gating rule.
    ///
    /// Matching is by non-empty intersection: a caller holding several roles
    /// passes if ANY required role matches.
    #[must_use]
    pub fn intersects(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.contains(*role))
    }

    /// Whether the set carries moderation privileges (ADMIN or `SUPER_ADMIN`).
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.0.iter().any(|role| role.is_privileged())
    }

    /// Add a role; a no-op when already present.
    pub fn insert(&mut self, role: Role) {
        if !self.0.contains(&role) {
            self.0.push(role);
        }
    }

    /// Remove a role; a no-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RoleSetError::Empty`] if removal would leave the set empty;
    /// the set is left unchanged in that case.
    pub fn remove(&mut self, role: Role) -> Result<(), RoleSetError> {
        if self.0 == [role] {
            return Err(RoleSetError::Empty);
        }
        self.0.retain(|r| *r != role);
        Ok(())
    }

    /// The roles as a slice, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    /// The stored string form for a `TEXT[]` column.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_owned()).collect()
    }
}

impl TryFrom<Vec<Role>> for RoleSet {
    type Error = RoleSetError;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::from_roles(roles)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Seller, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        assert!(matches!("VIEWER".parse::<Role>(), Err(RoleError(_))));
    }

    #[test]
    fn test_intersection_any_match_passes() {
        // A user with {SELLER, ADMIN} succeeds on a route requiring {ADMIN} alone.
        let set = RoleSet::from_roles([Role::Seller, Role::Admin]).unwrap();
        assert!(set.intersects(&[Role::Admin]));
        assert!(set.intersects(&[Role::Admin, Role::SuperAdmin]));
    }

    #[test]
    fn test_intersection_no_match_fails() {
        let set = RoleSet::seller();
        assert!(!set.intersects(&[Role::Admin, Role::SuperAdmin]));
        assert!(!set.intersects(&[]));
    }

    #[test]
    fn test_from_roles_dedups() {
        let set = RoleSet::from_roles([Role::Seller, Role::Seller, Role::Admin]).unwrap();
        assert_eq!(set.as_slice(), &[Role::Seller, Role::Admin]);
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(RoleSet::from_roles([]), Err(RoleSetError::Empty));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = RoleSet::seller();
        set.insert(Role::Admin);
        set.insert(Role::Admin);
        assert_eq!(set.as_slice(), &[Role::Seller, Role::Admin]);
    }

    #[test]
    fn test_remove_refuses_to_empty() {
        let mut set = RoleSet::seller();
        assert_eq!(set.remove(Role::Seller), Err(RoleSetError::Empty));
        assert_eq!(set.as_slice(), &[Role::Seller]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut set = RoleSet::seller();
        set.remove(Role::Admin).unwrap();
        assert_eq!(set.as_slice(), &[Role::Seller]);
    }

    #[test]
    fn test_parse_stored_form() {
        let set = RoleSet::parse(&["SUPER_ADMIN".to_owned(), "ADMIN".to_owned()]).unwrap();
        assert!(set.contains(Role::SuperAdmin));
        assert!(set.contains(Role::Admin));
        assert!(!set.contains(Role::Seller));
    }

    #[test]
    fn test_parse_unknown_stored_role() {
        let err = RoleSet::parse(&["MODERATOR".to_owned()]).unwrap_err();
        assert!(matches!(err, RoleSetError::UnknownRole(_)));
    }

    #[test]
    fn test_serde_as_sequence() {
        let set = RoleSet::from_roles([Role::SuperAdmin, Role::Admin]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["SUPER_ADMIN","ADMIN"]"#);

        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_serde_rejects_empty() {
        assert!(serde_json::from_str::<RoleSet>("[]").is_err());
    }
}

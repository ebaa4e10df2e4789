use crate::domain::user::{Role, User};

/// A flat set of roles. Roles are not ordered: an admin-only set rejects moderators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const ADMIN: RoleSet = RoleSet(&[Role::Admin]);
    pub const STAFF: RoleSet = RoleSet(&[Role::Admin, Role::Moderator]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateUsers,
    ManageUsers,
    ModerateUsers,
    ManageTournaments,
    ManageMatches,
    /// Submit a result for a match the caller did not play in.
    RefereeMatches,
    ManageTransactions,
    ManageOrders,
    ManageRewards,
    SendInvitations,
    AdministerEmail,
}

impl Capability {
    pub fn roles(&self) -> RoleSet {
        match self {
            Capability::CreateUsers
            | Capability::ManageUsers
            | Capability::ManageTransactions
            | Capability::ManageOrders
            | Capability::ManageRewards
            | Capability::AdministerEmail => RoleSet::ADMIN,
            Capability::ModerateUsers
            | Capability::ManageTournaments
            | Capability::ManageMatches
            | Capability::RefereeMatches
            | Capability::SendInvitations => RoleSet::STAFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("Account is deactivated")]
    AccountInactive,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

pub trait PermissionPolicy {
    fn allows(&self, role: Role) -> bool;
}

impl PermissionPolicy for Capability {
    fn allows(&self, role: Role) -> bool {
        self.roles().contains(role)
    }
}

/// Inactive accounts are rejected before any role check.
pub fn authorize(user: &User, policy: &impl PermissionPolicy) -> Result<(), AccessDenied> {
    if !user.is_active {
        return Err(AccessDenied::AccountInactive);
    }
    if !policy.allows(user.role) {
        return Err(AccessDenied::InsufficientPermissions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::UserId;

    fn account(role: Role, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: "staff@example.com".to_string(),
            username: "staff".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            gamer_tag: None,
            avatar: None,
            role,
            is_active,
            is_verified: true,
            level: 1,
            experience: 0,
            coins: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
            profile: None,
        }
    }

    #[test]
    fn test_admin_only_rejects_moderator() {
        assert_eq!(
            authorize(&account(Role::Moderator, true), &Capability::ManageTransactions),
            Err(AccessDenied::InsufficientPermissions)
        );
        assert!(authorize(&account(Role::Admin, true), &Capability::ManageTransactions).is_ok());
    }

    #[test]
    fn test_staff_capabilities() {
        assert!(authorize(&account(Role::Moderator, true), &Capability::ManageMatches).is_ok());
        assert!(authorize(&account(Role::Admin, true), &Capability::ModerateUsers).is_ok());
        assert_eq!(
            authorize(&account(Role::User, true), &Capability::ManageTournaments),
            Err(AccessDenied::InsufficientPermissions)
        );
    }

    #[test]
    fn test_inactive_rejected_first() {
        assert_eq!(
            authorize(&account(Role::Admin, false), &Capability::ManageUsers),
            Err(AccessDenied::AccountInactive)
        );
    }
}

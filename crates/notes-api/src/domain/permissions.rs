//! Role claims to permissions.
//!
//! The mapping is closed: a role string either names one of the known roles
//! or grants nothing.

use std::collections::BTreeSet;

/// Ordinary user role, assigned at signup.
pub const ROLE_USER: &str = "ROLE_USER";

/// Administrator role.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Role given to every new identity.
pub const DEFAULT_ROLE: &str = ROLE_USER;

/// Actions a principal may be allowed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// List and read own notes
    ReadNotes,
    /// Create and update own notes
    WriteNotes,
    /// Delete own notes
    DeleteNotes,
    /// Administrative identity management
    ManageIdentities,
}

const USER_PERMISSIONS: &[Permission] = &[
    Permission::ReadNotes,
    Permission::WriteNotes,
    Permission::DeleteNotes,
];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ReadNotes,
    Permission::WriteNotes,
    Permission::DeleteNotes,
    Permission::ManageIdentities,
];

/// Permissions granted by a single role claim.
pub fn permissions_for_role(role: &str) -> &'static [Permission] {
    match role {
        ROLE_USER => USER_PERMISSIONS,
        ROLE_ADMIN => ADMIN_PERMISSIONS,
        _ => &[],
    }
}

/// Union of permissions over a set of role claims.
pub fn permissions_for_roles<I, R>(roles: I) -> BTreeSet<Permission>
where
    I: IntoIterator<Item = R>,
    R: AsRef<str>,
{
    roles
        .into_iter()
        .flat_map(|role| permissions_for_role(role.as_ref()).iter().copied())
        .collect()
}

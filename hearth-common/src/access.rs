//! Roles, permissions and point-of-action access checks
//!
//! Roles form a closed set. Each role maps to a default [`PermissionSet`];
//! individual members may carry [`Grants`] that add or remove capabilities
//! on top of their role. Every mutating household operation calls
//! [`AccessControl::require`] before it acts.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Household role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Parent,
    Guardian,
    Teen,
    Child,
    Guest,
}

impl Role {
    /// All roles, most privileged first
    pub const ALL: [Role; 6] = [
        Role::Owner,
        Role::Parent,
        Role::Guardian,
        Role::Teen,
        Role::Child,
        Role::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Parent => "parent",
            Role::Guardian => "guardian",
            Role::Teen => "teen",
            Role::Child => "child",
            Role::Guest => "guest",
        }
    }

    /// Capabilities every member with this role starts with
    pub fn default_permissions(&self) -> PermissionSet {
        use Permission::*;
        match self {
            Role::Owner => PermissionSet::all(),
            Role::Parent => PermissionSet::from_slice(&[
                ManageMembers,
                InviteMembers,
                CreateTasks,
                AssignTasks,
                CompleteTasks,
                ViewCalendar,
                EditCalendar,
                ManageMealPlans,
                ManageGoals,
                ManageTrips,
                ViewAnalytics,
            ]),
            Role::Guardian => PermissionSet::from_slice(&[
                CreateTasks,
                AssignTasks,
                CompleteTasks,
                ViewCalendar,
                EditCalendar,
                ManageMealPlans,
            ]),
            Role::Teen => PermissionSet::from_slice(&[
                CreateTasks,
                CompleteTasks,
                ViewCalendar,
                EditCalendar,
                ManageGoals,
            ]),
            Role::Child => PermissionSet::from_slice(&[CompleteTasks, ViewCalendar]),
            Role::Guest => PermissionSet::from_slice(&[ViewCalendar]),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown role: {}", s.trim())))
    }
}

/// A single capability checked at the point of action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageMembers,
    ManageRoles,
    InviteMembers,
    CreateTasks,
    AssignTasks,
    CompleteTasks,
    ViewCalendar,
    EditCalendar,
    ManageMealPlans,
    ManageGoals,
    ManageTrips,
    ViewAnalytics,
    ManageSettings,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::ManageMembers,
        Permission::ManageRoles,
        Permission::InviteMembers,
        Permission::CreateTasks,
        Permission::AssignTasks,
        Permission::CompleteTasks,
        Permission::ViewCalendar,
        Permission::EditCalendar,
        Permission::ManageMealPlans,
        Permission::ManageGoals,
        Permission::ManageTrips,
        Permission::ViewAnalytics,
        Permission::ManageSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageMembers => "manage_members",
            Permission::ManageRoles => "manage_roles",
            Permission::InviteMembers => "invite_members",
            Permission::CreateTasks => "create_tasks",
            Permission::AssignTasks => "assign_tasks",
            Permission::CompleteTasks => "complete_tasks",
            Permission::ViewCalendar => "view_calendar",
            Permission::EditCalendar => "edit_calendar",
            Permission::ManageMealPlans => "manage_meal_plans",
            Permission::ManageGoals => "manage_goals",
            Permission::ManageTrips => "manage_trips",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageSettings => "manage_settings",
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown permission: {}", s.trim())))
    }
}

/// Set of capabilities, serialized as a list of permission names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct PermissionSet(u16);

impl PermissionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::from_slice(&Permission::ALL)
    }

    pub fn from_slice(permissions: &[Permission]) -> Self {
        permissions.iter().fold(Self::empty(), |set, p| set.with(*p))
    }

    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.bit();
    }

    pub const fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members of the set in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(permissions: Vec<Permission>) -> Self {
        Self::from_slice(&permissions)
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(set: PermissionSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, p| set.with(p))
    }
}

/// Per-member adjustments on top of the role defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    #[serde(default)]
    pub granted: PermissionSet,
    #[serde(default)]
    pub revoked: PermissionSet,
}

impl Grants {
    /// Role defaults plus grants minus revocations; owners keep everything
    pub fn effective(&self, role: Role) -> PermissionSet {
        if role == Role::Owner {
            return PermissionSet::all();
        }
        role.default_permissions()
            .union(self.granted)
            .difference(self.revoked)
    }

    pub fn grant(&mut self, permission: Permission) {
        self.revoked.remove(permission);
        self.granted.insert(permission);
    }

    pub fn revoke(&mut self, permission: Permission) {
        self.granted.remove(permission);
        self.revoked.insert(permission);
    }
}

/// Point-of-action capability check
pub struct AccessControl;

impl AccessControl {
    /// Fail with [`Error::PermissionDenied`] unless `permission` is effective
    pub fn require(role: Role, grants: &Grants, permission: Permission) -> Result<()> {
        if grants.effective(role).contains(permission) {
            return Ok(());
        }
        warn!(role = %role, permission = %permission, "Permission denied");
        Err(Error::PermissionDenied {
            role: role.to_string(),
            permission: permission.to_string(),
        })
    }

    pub fn allows(role: Role, grants: &Grants, permission: Permission) -> bool {
        grants.effective(role).contains(permission)
    }
}

/// Role defaults in role order, for display
pub fn permission_matrix() -> Vec<(Role, PermissionSet)> {
    Role::ALL
        .into_iter()
        .map(|role| (role, role.default_permissions()))
        .collect()
}

//! Permission group domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Permissions that can be granted on a permission group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclPermission {
    #[serde(rename = "read:permissionGroups")]
    ReadPermissionGroups,
    #[serde(rename = "manage:permissionGroups")]
    ManagePermissionGroups,
    #[serde(rename = "assign:permissionGroups")]
    AssignPermissionGroups,
    #[serde(rename = "unassign:permissionGroups")]
    UnassignPermissionGroups,
}

impl AclPermission {
    pub fn value(&self) -> &'static str {
        match self {
            AclPermission::ReadPermissionGroups => "read:permissionGroups",
            AclPermission::ManagePermissionGroups => "manage:permissionGroups",
            AclPermission::AssignPermissionGroups => "assign:permissionGroups",
            AclPermission::UnassignPermissionGroups => "unassign:permissionGroups",
        }
    }
}

impl std::fmt::Display for AclPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Grants `permission` to members of any of `permission_groups`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub permission: String,
    #[serde(default)]
    pub permission_groups: BTreeSet<String>,
}

/// Role-like grouping of users within a workspace
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_workspace_id: Option<String>,
    #[serde(default)]
    pub assigned_to_user_ids: BTreeSet<String>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl PermissionGroup {
    /// True if some policy grants `permission` to one of `group_ids`
    pub fn grants(&self, permission: AclPermission, group_ids: &BTreeSet<String>) -> bool {
        self.policies.iter().any(|p| {
            p.permission == permission.value() && !p.permission_groups.is_disjoint(group_ids)
        })
    }
}

/// Caller's permission check for a single lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionContext {
    pub permission: AclPermission,
    /// Permission groups the caller belongs to
    pub permission_group_ids: BTreeSet<String>,
}

impl PermissionContext {
    pub fn new<I, S>(permission: AclPermission, permission_group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permission,
            permission_group_ids: permission_group_ids.into_iter().map(Into::into).collect(),
        }
    }
}

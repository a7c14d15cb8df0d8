//! Permission group lookups
//!
//! Read-only, idempotent query surface. Results are ordered by group id.

use crate::acl::permission_group::{PermissionContext, PermissionGroup};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    /// Groups whose id is in `ids`; unknown ids are skipped
    async fn find_all_by_id(&self, ids: &BTreeSet<String>) -> Result<Vec<PermissionGroup>>;

    /// The group with `id`, if the caller holds `context.permission` on it
    async fn find_by_id(&self, id: &str, context: &PermissionContext) -> Result<Option<PermissionGroup>>;

    /// Groups assigned to at least one of `user_ids`
    async fn find_by_assigned_to_user_ids_in(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<Vec<PermissionGroup>>;

    /// Groups owned by the workspace
    async fn find_by_default_workspace_id(&self, workspace_id: &str) -> Result<Vec<PermissionGroup>>;
}

/// Repository over a fixed set of groups held in memory
pub struct InMemoryPermissionGroupRepository {
    groups: BTreeMap<String, PermissionGroup>,
}

impl InMemoryPermissionGroupRepository {
    /// Seed the repository. A later group with a repeated id replaces the earlier one.
    pub fn new(groups: impl IntoIterator<Item = PermissionGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    fn filter<F>(&self, predicate: F) -> Vec<PermissionGroup>
    where
        F: Fn(&PermissionGroup) -> bool,
    {
        self.groups.values().filter(|g| predicate(g)).cloned().collect()
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionGroupRepository {
    async fn find_all_by_id(&self, ids: &BTreeSet<String>) -> Result<Vec<PermissionGroup>> {
        Ok(self.filter(|g| ids.contains(&g.id)))
    }

    async fn find_by_id(&self, id: &str, context: &PermissionContext) -> Result<Option<PermissionGroup>> {
        let found = self
            .groups
            .get(id)
            .filter(|g| g.grants(context.permission, &context.permission_group_ids))
            .cloned();
        if found.is_none() {
            log::debug!("permission group {} not found or {} not granted", id, context.permission);
        }
        Ok(found)
    }

    async fn find_by_assigned_to_user_ids_in(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<Vec<PermissionGroup>> {
        Ok(self.filter(|g| !g.assigned_to_user_ids.is_disjoint(user_ids)))
    }

    async fn find_by_default_workspace_id(&self, workspace_id: &str) -> Result<Vec<PermissionGroup>> {
        Ok(self.filter(|g| g.default_workspace_id.as_deref() == Some(workspace_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::permission_group::{AclPermission, Policy};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn group(id: &str, workspace: Option<&str>, users: &[&str], readers: &[&str]) -> PermissionGroup {
        PermissionGroup {
            id: id.to_string(),
            name: format!("{} group", id),
            default_workspace_id: workspace.map(str::to_string),
            assigned_to_user_ids: set(users),
            policies: vec![Policy {
                permission: AclPermission::ReadPermissionGroups.value().to_string(),
                permission_groups: set(readers),
            }],
        }
    }

    fn repository() -> InMemoryPermissionGroupRepository {
        InMemoryPermissionGroupRepository::new(vec![
            group("pg-3", Some("ws-2"), &["u-2"], &["pg-1"]),
            group("pg-1", Some("ws-1"), &["u-1", "u-2"], &["pg-1"]),
            group("pg-2", Some("ws-1"), &[], &[]),
            group("pg-4", None, &["u-3"], &["pg-4"]),
        ])
    }

    fn ids(groups: &[PermissionGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_find_all_by_id_skips_unknown() {
        let repo = repository();
        let found = repo.find_all_by_id(&set(&["pg-3", "pg-1", "missing"])).await.unwrap();
        assert_eq!(ids(&found), vec!["pg-1", "pg-3"]);
        assert!(repo.find_all_by_id(&BTreeSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_checks_permission() {
        let repo = repository();
        let reader = PermissionContext::new(AclPermission::ReadPermissionGroups, ["pg-1"]);
        let manager = PermissionContext::new(AclPermission::ManagePermissionGroups, ["pg-1"]);
        let outsider = PermissionContext::new(AclPermission::ReadPermissionGroups, ["pg-9"]);

        assert_eq!(repo.find_by_id("pg-3", &reader).await.unwrap().unwrap().id, "pg-3");
        assert!(repo.find_by_id("pg-3", &manager).await.unwrap().is_none());
        assert!(repo.find_by_id("pg-3", &outsider).await.unwrap().is_none());
        assert!(repo.find_by_id("nope", &reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_assigned_user() {
        let repo = repository();
        let found = repo.find_by_assigned_to_user_ids_in(&set(&["u-2"])).await.unwrap();
        assert_eq!(ids(&found), vec!["pg-1", "pg-3"]);

        let found = repo
            .find_by_assigned_to_user_ids_in(&set(&["u-1", "u-3"]))
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["pg-1", "pg-4"]);
    }

    #[tokio::test]
    async fn test_find_by_workspace() {
        let repo = repository();
        let found = repo.find_by_default_workspace_id("ws-1").await.unwrap();
        assert_eq!(ids(&found), vec!["pg-1", "pg-2"]);
        assert!(repo.find_by_default_workspace_id("ws-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_id_keeps_last() {
        let repo = InMemoryPermissionGroupRepository::new(vec![
            group("pg-1", Some("ws-1"), &[], &[]),
            group("pg-1", Some("ws-2"), &[], &[]),
        ]);
        let found = repo.find_all_by_id(&set(&["pg-1"])).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].default_workspace_id.as_deref(), Some("ws-2"));
    }

    #[tokio::test]
    async fn test_lookups_are_idempotent() {
        let repo = repository();
        let first = repo.find_by_default_workspace_id("ws-1").await.unwrap();
        let second = repo.find_by_default_workspace_id("ws-1").await.unwrap();
        assert_eq!(first, second);
    }
}

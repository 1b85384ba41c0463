//! Groups and the group registry
//!
//! The registry map only guards which groups exist. Each group has its own
//! `RwLock` for its member set: callers clone the group's `Arc` out of the
//! map, release the map, then lock the group.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::AppError;
use crate::user::User;

/// Named set of member usernames
///
/// Created empty; may become empty again without being removed.
#[derive(Debug)]
pub struct Group {
    pub name: String,
    members: HashSet<String>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    /// Add a member. Returns false if it was already present.
    pub fn add_member(&mut self, username: &str) -> bool {
        self.members.insert(username.to_string())
    }

    /// Remove a member. Returns false if it was not present.
    pub fn remove_member(&mut self, username: &str) -> bool {
        self.members.remove(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.members.contains(username)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

pub type SharedGroup = Arc<RwLock<Group>>;

#[derive(Default)]
pub struct GroupRegistry {
    /// All groups: name -> Group
    groups: DashMap<String, SharedGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group
    ///
    /// Checks, in order: requester logged in, requester is admin, name unused.
    pub fn create(&self, name: &str, requester: Option<&User>) -> Result<(), AppError> {
        let requester = requester.ok_or(AppError::NotLoggedIn)?;
        if !requester.is_admin() {
            return Err(AppError::NotAdmin);
        }

        match self.groups.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AppError::GroupExists),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(RwLock::new(Group::new(name.to_string()))));
                info!("User '{}' created group '{}'", requester.username, name);
                Ok(())
            }
        }
    }

    /// Group handle, with the registry lock already released
    pub fn get(&self, name: &str) -> Option<SharedGroup> {
        self.groups.get(name).map(|group| Arc::clone(group.value()))
    }

    /// Names of all groups, sorted
    ///
    /// A snapshot: callers may iterate it as often as they like.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|g| g.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Add `username` to a group; joining twice is a no-op
    pub async fn join(&self, name: &str, username: &str) -> Result<(), AppError> {
        let group = self.get(name).ok_or(AppError::GroupNotFound)?;
        let mut group = group.write().await;
        if group.add_member(username) {
            info!("User '{}' joined group '{}'", username, name);
        } else {
            debug!("User '{}' already in group '{}'", username, name);
        }
        Ok(())
    }

    /// Remove `username` from a group
    pub async fn leave(&self, name: &str, username: &str) -> Result<(), AppError> {
        let group = self.get(name).ok_or(AppError::GroupNotFound)?;
        let mut group = group.write().await;
        if !group.remove_member(username) {
            return Err(AppError::NotMember);
        }
        info!("User '{}' left group '{}'", username, name);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn admin() -> User {
        User::new("root".to_string(), "pw".to_string(), Role::Admin)
    }

    fn member() -> User {
        User::new("joe".to_string(), "pw".to_string(), Role::Member)
    }

    #[test]
    fn test_group_membership() {
        let mut group = Group::new("news".to_string());
        assert!(group.add_member("alice"));
        assert!(!group.add_member("alice"));
        assert_eq!(group.member_count(), 1);
        assert!(group.contains("alice"));
        assert!(group.remove_member("alice"));
        assert!(!group.remove_member("alice"));
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_create_requires_login() {
        let registry = GroupRegistry::new();
        let err = registry.create("news", None).unwrap_err();
        assert!(matches!(err, AppError::NotLoggedIn));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_requires_admin() {
        let registry = GroupRegistry::new();
        let err = registry.create("news", Some(&member())).unwrap_err();
        assert!(matches!(err, AppError::NotAdmin));
        assert!(registry.get("news").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_keeps_members() {
        let registry = GroupRegistry::new();
        registry.create("news", Some(&admin())).unwrap();
        registry.join("news", "alice").await.unwrap();

        let err = registry.create("news", Some(&admin())).unwrap_err();
        assert!(matches!(err, AppError::GroupExists));

        let group = registry.get("news").unwrap();
        assert!(group.read().await.contains("alice"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_groups() {
        let registry = GroupRegistry::new();
        assert!(registry.list().is_empty());

        registry.create("sports", Some(&admin())).unwrap();
        registry.create("news", Some(&admin())).unwrap();
        assert_eq!(registry.list(), vec!["news", "sports"]);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let registry = GroupRegistry::new();
        registry.create("news", Some(&admin())).unwrap();

        registry.join("news", "bob").await.unwrap();
        registry.join("news", "bob").await.unwrap();

        let group = registry.get("news").unwrap();
        assert_eq!(group.read().await.member_count(), 1);
    }

    #[tokio::test]
    async fn test_join_missing_group() {
        let registry = GroupRegistry::new();
        let err = registry.join("nowhere", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::GroupNotFound));
    }

    #[tokio::test]
    async fn test_leave_twice_fails_second_time() {
        let registry = GroupRegistry::new();
        registry.create("news", Some(&admin())).unwrap();
        registry.join("news", "bob").await.unwrap();
        registry.join("news", "carol").await.unwrap();

        registry.leave("news", "bob").await.unwrap();
        let err = registry.leave("news", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NotMember));

        let group = registry.get("news").unwrap();
        let group = group.read().await;
        assert_eq!(group.member_count(), 1);
        assert!(group.contains("carol"));
    }

    #[tokio::test]
    async fn test_leave_missing_group() {
        let registry = GroupRegistry::new();
        let err = registry.leave("nowhere", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::GroupNotFound));
    }

    #[tokio::test]
    async fn test_concurrent_joins() {
        let registry = Arc::new(GroupRegistry::new());
        registry.create("news", Some(&admin())).unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.join("news", &format!("user{}", i % 8)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let group = registry.get("news").unwrap();
        assert_eq!(group.read().await.member_count(), 8);
    }
}

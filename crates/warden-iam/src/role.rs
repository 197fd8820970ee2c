//! Roles and the role directory.
//!
//! # Purpose
//! Stores named bundles of permission ids. Roles reference permissions; they
//! never own them, and one permission may sit in many roles.
//!
//! # Key invariants
//! - Role names are trimmed and lowercased.
//! - A role's permission list is an ordered set.
//! - Updates are published atomically (same snapshot scheme as the
//!   permission registry).
use crate::{IamError, IamResult, PermissionId};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const GUEST_ROLE: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub permissions: Vec<PermissionId>,
    pub protected: bool,
}

impl Role {
    pub fn new(name: &str) -> IamResult<Self> {
        Ok(Self {
            name: normalize_role(name).ok_or_else(|| IamError::InvalidKey(name.to_string()))?,
            title: None,
            description: None,
            permissions: Vec::new(),
            protected: false,
        })
    }

    fn grant(&mut self, id: PermissionId) -> bool {
        if self.permissions.contains(&id) {
            return false;
        }
        self.permissions.push(id);
        true
    }
}

/// Trim and lowercase a role name; blank names yield `None`.
pub fn normalize_role(name: &str) -> Option<String> {
    let name = name.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Normalize a caller's role list: drop blanks and duplicates, keep order,
/// and fall back to `["guest"]` when nothing is left.
pub fn normalize_roles<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names.iter().filter_map(|name| normalize_role(name.as_ref())) {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    if out.is_empty() {
        out.push(GUEST_ROLE.to_string());
    }
    out
}

#[derive(Debug, Default)]
pub struct RoleDirectory {
    roles: ArcSwap<HashMap<String, Arc<Role>>>,
    writer: Mutex<()>,
}

impl RoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Role>> {
        let name = normalize_role(name)?;
        self.roles.load().get(&name).cloned()
    }

    /// Find roles by name. Unknown names are skipped, not reported.
    pub fn find_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<Role>> {
        let roles = self.roles.load();
        let mut found: Vec<Arc<Role>> = Vec::new();
        for name in names.iter().filter_map(|name| normalize_role(name.as_ref())) {
            match roles.get(&name) {
                Some(role) if !found.iter().any(|r| r.name == role.name) => {
                    found.push(Arc::clone(role))
                }
                Some(_) => {}
                None => tracing::debug!(role = %name, "ignoring unknown role"),
            }
        }
        found
    }

    pub fn list(&self) -> Vec<Arc<Role>> {
        let mut roles: Vec<Arc<Role>> = self.roles.load().values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Create `role` or merge it into the stored one.
    ///
    /// Metadata present on `role` overwrites the stored values; permission
    /// ids are only added, never removed.
    pub fn merge(&self, role: Role) -> Arc<Role> {
        self.update(&role.name.clone(), move |existing| match existing {
            None => role,
            Some(current) => {
                let mut merged = current.clone();
                if role.title.is_some() {
                    merged.title = role.title;
                }
                if role.description.is_some() {
                    merged.description = role.description;
                }
                merged.protected |= role.protected;
                for id in role.permissions {
                    merged.grant(id);
                }
                merged
            }
        })
    }

    /// Insert a new role.
    ///
    /// # Errors
    /// - [`IamError::RoleExists`] if a role already carries the name.
    pub fn insert(&self, role: Role) -> IamResult<Arc<Role>> {
        let _guard = self.writer.lock();
        let current = self.roles.load_full();
        if current.contains_key(&role.name) {
            return Err(IamError::RoleExists(role.name));
        }
        let role = Arc::new(role);
        let mut next = HashMap::clone(&current);
        next.insert(role.name.clone(), Arc::clone(&role));
        self.roles.store(Arc::new(next));
        Ok(role)
    }

    /// Apply `edit` to an existing role and publish the result.
    ///
    /// The role name is kept whatever `edit` does to it.
    ///
    /// # Errors
    /// - [`IamError::UnknownRole`] if no role carries `name`.
    pub fn modify(&self, name: &str, edit: impl FnOnce(&mut Role)) -> IamResult<Arc<Role>> {
        let name = normalize_role(name).ok_or_else(|| IamError::UnknownRole(name.to_string()))?;
        let _guard = self.writer.lock();
        let current = self.roles.load_full();
        let existing = current
            .get(&name)
            .ok_or_else(|| IamError::UnknownRole(name.clone()))?;
        let mut role = Role::clone(existing);
        edit(&mut role);
        role.name = name.clone();
        let role = Arc::new(role);
        let mut next = HashMap::clone(&current);
        next.insert(name, Arc::clone(&role));
        self.roles.store(Arc::new(next));
        Ok(role)
    }

    /// Replace the permission set of an existing role.
    ///
    /// # Errors
    /// - [`IamError::UnknownRole`] if no role carries `name`.
    pub fn replace_permissions(
        &self,
        name: &str,
        permissions: Vec<PermissionId>,
    ) -> IamResult<Arc<Role>> {
        self.modify(name, |role| {
            role.permissions.clear();
            for id in permissions {
                role.grant(id);
            }
        })
    }

    fn update(&self, name: &str, apply: impl FnOnce(Option<&Role>) -> Role) -> Arc<Role> {
        let _guard = self.writer.lock();
        let current = self.roles.load_full();
        let role = Arc::new(apply(current.get(name).map(|role| &**role)));
        let mut next = HashMap::clone(&current);
        next.insert(role.name.clone(), Arc::clone(&role));
        self.roles.store(Arc::new(next));
        role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, ids: &[u32]) -> Role {
        let mut role = Role::new(name).expect("role");
        role.permissions = ids.iter().map(|id| PermissionId(*id)).collect();
        role
    }

    #[test]
    fn role_names_are_normalized() {
        assert_eq!(normalize_role("  Admin "), Some("admin".to_string()));
        assert_eq!(normalize_role("   "), None);
        assert!(Role::new(" ").is_err());
    }

    #[test]
    fn empty_role_list_defaults_to_guest() {
        let empty: [&str; 0] = [];
        assert_eq!(normalize_roles(&empty), vec!["guest".to_string()]);
        assert_eq!(normalize_roles(&["", "  "]), vec!["guest".to_string()]);
        assert_eq!(
            normalize_roles(&["Admin", "user", "admin"]),
            vec!["admin".to_string(), "user".to_string()]
        );
    }

    #[test]
    fn merge_only_adds_permissions() {
        let directory = RoleDirectory::new();
        directory.merge(role("user", &[1, 2]));
        let merged = directory.merge(role("user", &[2, 3]));
        assert_eq!(
            merged.permissions,
            vec![PermissionId(1), PermissionId(2), PermissionId(3)]
        );
    }

    #[test]
    fn merge_keeps_metadata_when_absent() {
        let directory = RoleDirectory::new();
        let mut first = role("admin", &[]);
        first.title = Some("Admin role".to_string());
        first.protected = true;
        directory.merge(first);
        let merged = directory.merge(role("admin", &[4]));
        assert_eq!(merged.title.as_deref(), Some("Admin role"));
        assert!(merged.protected);
    }

    #[test]
    fn find_by_names_skips_unknown_roles() {
        let directory = RoleDirectory::new();
        directory.merge(role("user", &[1]));
        let found = directory.find_by_names(&["ghost", "USER", "user"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "user");
    }

    #[test]
    fn replace_permissions_swaps_set() {
        let directory = RoleDirectory::new();
        directory.merge(role("editor", &[1, 2]));
        let replaced = directory
            .replace_permissions("Editor", vec![PermissionId(5), PermissionId(5)])
            .expect("replace");
        assert_eq!(replaced.permissions, vec![PermissionId(5)]);
        assert_eq!(
            directory.get("editor").expect("role").permissions,
            vec![PermissionId(5)]
        );
    }

    #[test]
    fn replace_permissions_on_unknown_role_fails() {
        let directory = RoleDirectory::new();
        let err = directory
            .replace_permissions("ghost", Vec::new())
            .expect_err("unknown");
        assert!(matches!(err, IamError::UnknownRole(_)));
    }

    #[test]
    fn insert_rejects_existing_name() {
        let directory = RoleDirectory::new();
        directory.insert(role("editor", &[1])).expect("insert");
        let err = directory.insert(role("Editor", &[2])).expect_err("duplicate");
        assert!(matches!(err, IamError::RoleExists(name) if name == "editor"));
        assert_eq!(
            directory.get("editor").expect("role").permissions,
            vec![PermissionId(1)]
        );
    }

    #[test]
    fn modify_keeps_name_and_other_fields() {
        let directory = RoleDirectory::new();
        let mut editor = role("editor", &[1]);
        editor.protected = true;
        directory.merge(editor);
        let edited = directory
            .modify("editor", |role| {
                role.title = Some("Editors".to_string());
                role.name = "renamed".to_string();
            })
            .expect("modify");
        assert_eq!(edited.name, "editor");
        assert_eq!(edited.title.as_deref(), Some("Editors"));
        assert!(edited.protected);
        assert_eq!(edited.permissions, vec![PermissionId(1)]);
        assert!(directory.get("renamed").is_none());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let directory = RoleDirectory::new();
        directory.merge(role("user", &[]));
        directory.merge(role("admin", &[]));
        directory.merge(role("guest", &[]));
        let names: Vec<String> = directory.list().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["admin", "guest", "user"]);
    }
}

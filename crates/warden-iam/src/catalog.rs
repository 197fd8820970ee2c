//! Read seam between the engine and wherever permissions and roles live.
//!
//! # Purpose
//! The aggregator and the authorizer only need three reads. [`IamCatalog`]
//! names them so a storage-backed implementation can report failures, while
//! [`Iam`] serves them from the in-memory registry and role directory.
use crate::{
    IamError, IamResult, Permission, PermissionId, PermissionRegistry, Role, RoleDefinition,
    RoleDirectory, normalize_role,
};
use serde::Deserialize;
use std::sync::Arc;

pub trait IamCatalog: Send + Sync {
    /// Roles matching `names`; unknown names are absent from the result.
    fn roles_by_names(&self, names: &[String]) -> IamResult<Vec<Arc<Role>>>;

    /// Children closure of `roots`, roots included.
    fn resolve_children(&self, roots: &[PermissionId]) -> IamResult<Vec<Arc<Permission>>>;

    /// Every registered permission, excluded ones included.
    fn all_permissions(&self) -> IamResult<Vec<Arc<Permission>>>;
}

/// In-memory permission registry plus role directory.
#[derive(Debug, Default)]
pub struct Iam {
    registry: PermissionRegistry,
    roles: RoleDirectory,
}

impl Iam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    /// Administrative create.
    ///
    /// Keys that are unknown or point at a non-affectable permission are
    /// dropped.
    ///
    /// # Errors
    /// - [`IamError::InvalidKey`] for a blank role name.
    /// - [`IamError::RoleExists`] if the name is taken.
    pub fn create_role(&self, definition: &RoleDefinition) -> IamResult<Arc<Role>> {
        let name = normalize_role(&definition.name)
            .ok_or_else(|| IamError::InvalidKey(definition.name.clone()))?;
        let mut role = Role::new(&name)?;
        role.title = definition.title.clone();
        role.description = definition.description.clone();
        role.protected = definition.protected;
        role.permissions = self.affectable_ids(&definition.permissions);
        let created = self.roles.insert(role)?;
        tracing::info!(
            role = %created.name,
            permissions = created.permissions.len(),
            "role created"
        );
        Ok(created)
    }

    /// Administrative edit: apply the fields present in `changes`.
    ///
    /// Permission keys are filtered as in [`Iam::create_role`].
    ///
    /// # Errors
    /// - [`IamError::UnknownRole`] if the role does not exist.
    pub fn update_role(&self, role: &str, changes: &RoleChanges) -> IamResult<Arc<Role>> {
        let ids = changes
            .permissions
            .as_deref()
            .map(|keys| self.affectable_ids(keys));
        let updated = self.roles.modify(role, |current| {
            if let Some(title) = &changes.title {
                current.title = Some(title.clone());
            }
            if let Some(description) = &changes.description {
                current.description = Some(description.clone());
            }
            if let Some(ids) = ids {
                current.permissions = ids;
            }
        })?;
        tracing::info!(
            role = %updated.name,
            permissions = updated.permissions.len(),
            "role updated"
        );
        Ok(updated)
    }

    /// Replace the permissions attached to a role.
    ///
    /// # Errors
    /// - [`IamError::UnknownRole`] if the role does not exist.
    pub fn replace_role_permissions<S: AsRef<str>>(
        &self,
        role: &str,
        keys: &[S],
    ) -> IamResult<Arc<Role>> {
        let changes = RoleChanges {
            permissions: Some(keys.iter().map(|key| key.as_ref().to_string()).collect()),
            ..RoleChanges::default()
        };
        self.update_role(role, &changes)
    }

    fn affectable_ids<S: AsRef<str>>(&self, keys: &[S]) -> Vec<PermissionId> {
        let mut ids: Vec<PermissionId> = Vec::new();
        for permission in self.registry.find_by_keys(keys) {
            if permission.affectable && !ids.contains(&permission.id) {
                ids.push(permission.id);
            }
        }
        ids
    }
}

/// Partial role edit; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "iams")]
    pub permissions: Option<Vec<String>>,
}

impl IamCatalog for Iam {
    fn roles_by_names(&self, names: &[String]) -> IamResult<Vec<Arc<Role>>> {
        Ok(self.roles.find_by_names(names))
    }

    fn resolve_children(&self, roots: &[PermissionId]) -> IamResult<Vec<Arc<Permission>>> {
        Ok(self.registry.resolve_children(roots))
    }

    fn all_permissions(&self) -> IamResult<Vec<Arc<Permission>>> {
        Ok(self.registry.find_all())
    }
}

//! HTTP API request/response types.
use serde::{Deserialize, Serialize};
use warden_iam::{Permission, PermissionRegistry, Role, RoleChanges, RoleDefinition};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProfileResponse {
    pub subject: String,
    pub display_name: Option<String>,
    pub anonymous: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PermissionView {
    pub key: String,
    pub resource: Option<String>,
    pub method: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub module: Option<String>,
    pub groups: Vec<String>,
    pub children: Vec<String>,
    pub affectable: bool,
    pub system: bool,
    pub excluded: bool,
}

impl PermissionView {
    /// Child ids are rendered as keys, resolved against `registry`.
    pub fn new(permission: &Permission, registry: &PermissionRegistry) -> Self {
        let children: Vec<_> = permission.children.iter().copied().collect();
        Self {
            key: permission.key.clone(),
            resource: permission.resource.as_ref().map(|r| r.to_string()),
            method: permission.method.map(|m| m.to_string()),
            title: permission.title.clone(),
            description: permission.description.clone(),
            module: permission.module.clone(),
            groups: permission.groups.clone(),
            children: registry
                .find_by_ids(&children)
                .iter()
                .map(|child| child.key.clone())
                .collect(),
            affectable: permission.affectable,
            system: permission.system,
            excluded: permission.excluded,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListPermissionsResponse {
    pub items: Vec<PermissionView>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoleView {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub protected: bool,
    pub permissions: Vec<String>,
    /// Full permission metadata, present only for callers allowed to list
    /// permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iams: Option<Vec<PermissionView>>,
}

impl RoleView {
    pub fn new(role: &Role, registry: &PermissionRegistry, with_details: bool) -> Self {
        let permissions = registry.find_by_ids(&role.permissions);
        Self {
            name: role.name.clone(),
            title: role.title.clone(),
            description: role.description.clone(),
            protected: role.protected,
            permissions: permissions.iter().map(|p| p.key.clone()).collect(),
            iams: with_details.then(|| {
                permissions
                    .iter()
                    .map(|p| PermissionView::new(p, registry))
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListRolesResponse {
    pub items: Vec<RoleView>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoleCreateRequest {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "iams")]
    pub permissions: Vec<String>,
}

impl RoleCreateRequest {
    pub fn into_definition(self) -> RoleDefinition {
        RoleDefinition {
            name: self.name,
            title: self.title,
            description: self.description,
            permissions: self.permissions,
            protected: false,
        }
    }
}

/// Absent fields are left untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RoleUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "iams")]
    pub permissions: Option<Vec<String>>,
}

impl RoleUpdateRequest {
    pub fn into_changes(self) -> RoleChanges {
        RoleChanges {
            title: self.title,
            description: self.description,
            permissions: self.permissions,
        }
    }
}

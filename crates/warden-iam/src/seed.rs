//! Boot-time seeding from static records.
//!
//! Permission records carry a raw stored resource pattern instead of a route
//! template; a pattern that does not compile is kept and skipped at match
//! time. Role definitions are merged into the role directory: a new role is
//! created, an existing one only gains the permissions it is missing.
use crate::{
    HttpMethod, Iam, IamError, IamResult, PermissionMeta, ResourcePattern, Role, normalize_role,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PermissionRecord {
    #[serde(alias = "iam")]
    pub key: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub affectable: Option<bool>,
    #[serde(default)]
    pub system: Option<bool>,
    #[serde(default)]
    pub excluded: Option<bool>,
}

impl PermissionRecord {
    /// Parse a YAML list of records.
    ///
    /// # Errors
    /// - [`IamError::InvalidRouteTable`] when the document is not a list of
    ///   records.
    pub fn list_from_yaml_str(content: &str) -> IamResult<Vec<Self>> {
        serde_yaml::from_str(content).map_err(|err| IamError::InvalidRouteTable(err.to_string()))
    }

    pub fn list_from_file(path: impl AsRef<Path>) -> IamResult<Vec<Self>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            IamError::InvalidRouteTable(format!("{}: {err}", path.display()))
        })?;
        Self::list_from_yaml_str(&content).map_err(|err| match err {
            IamError::InvalidRouteTable(reason) => {
                IamError::InvalidRouteTable(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    fn meta(&self) -> PermissionMeta {
        PermissionMeta {
            title: self.title.clone(),
            description: self.description.clone(),
            module: self.module.clone(),
            groups: self.groups.clone(),
            parents: self.parents.clone(),
            affectable: self.affectable,
            system: self.system,
            excluded: self.excluded,
        }
    }
}

/// Upsert every record by key. Returns the number of records applied.
///
/// # Errors
/// - [`IamError::InvalidKey`] for a record with a blank key.
pub fn import_permissions(iam: &Iam, records: &[PermissionRecord]) -> IamResult<usize> {
    for record in records {
        let resource = record.resource.as_deref().map(ResourcePattern::from_stored);
        iam.registry()
            .upsert(&record.key, resource, record.method, &record.meta())?;
    }
    tracing::info!(records = records.len(), "permission records imported");
    Ok(records.len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "iams")]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub protected: bool,
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn permissions<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

/// Merge role definitions into the directory.
///
/// Keys that are not registered are skipped with a debug log.
///
/// # Errors
/// - [`IamError::InvalidKey`] for a definition with a blank name.
pub fn seed_roles(iam: &Iam, definitions: &[RoleDefinition]) -> IamResult<Vec<Arc<Role>>> {
    let mut seeded = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let name = normalize_role(&definition.name)
            .ok_or_else(|| IamError::InvalidKey(definition.name.clone()))?;
        let found = iam.registry().find_by_keys(&definition.permissions);
        if found.len() < definition.permissions.len() {
            tracing::debug!(
                role = %name,
                declared = definition.permissions.len(),
                resolved = found.len(),
                "role references unregistered permissions"
            );
        }

        let mut role = Role::new(&name)?;
        role.title = definition.title.clone();
        role.description = definition.description.clone();
        role.protected = definition.protected;
        role.permissions = found.iter().map(|permission| permission.id).collect();
        seeded.push(iam.roles().merge(role));
    }
    tracing::info!(roles = seeded.len(), "roles seeded");
    Ok(seeded)
}

//! Permission (IAM entry) data model.
//!
//! # Purpose
//! Defines the registry's node type, its arena identifier, and the metadata
//! accepted on upsert.
//!
//! # Key invariants
//! - Keys are trimmed and lowercased before they reach the registry.
//! - `children` is a set; adding an existing child is a no-op.
//! - A permission created only as someone's parent has no resource and no
//!   method, so it never matches a request on its own.
//!
//! # Examples
//! ```rust
//! use warden_iam::{normalize_groups, normalize_key};
//!
//! assert_eq!(normalize_key("  Users:Admin:List ").unwrap(), "users:admin:list");
//! assert_eq!(normalize_groups(["User  Admin", "user admin", ""]), vec!["user-admin"]);
//! ```
use crate::{HttpMethod, IamError, IamResult, ResourcePattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Arena index of a permission inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(pub u32);

impl PermissionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: PermissionId,
    pub key: String,
    pub resource: Option<ResourcePattern>,
    pub method: Option<HttpMethod>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub module: Option<String>,
    pub groups: Vec<String>,
    pub children: BTreeSet<PermissionId>,
    pub affectable: bool,
    pub system: bool,
    pub excluded: bool,
}

impl Permission {
    pub(crate) fn placeholder(id: PermissionId, key: String) -> Self {
        Self {
            id,
            key,
            resource: None,
            method: None,
            title: None,
            description: None,
            module: None,
            groups: Vec::new(),
            children: BTreeSet::new(),
            affectable: true,
            system: false,
            excluded: false,
        }
    }

    /// Whether this entry governs `method` + `path`.
    ///
    /// Returns `None` when the stored resource pattern is unusable, so the
    /// caller can skip the entry and report it.
    pub fn governs(&self, method: &str, path: &str) -> Option<bool> {
        let (Some(resource), Some(bound)) = (&self.resource, self.method) else {
            return Some(false);
        };
        if !bound.accepts(method) {
            return Some(false);
        }
        resource.matches(path)
    }

    pub(crate) fn apply(&mut self, meta: &PermissionMeta) {
        if let Some(title) = &meta.title {
            self.title = Some(title.clone());
        }
        if let Some(description) = &meta.description {
            self.description = Some(description.clone());
        }
        if let Some(module) = &meta.module {
            self.module = Some(module.clone());
        }
        let groups = normalize_groups(&meta.groups);
        if !groups.is_empty() {
            self.groups = groups;
        }
        if let Some(affectable) = meta.affectable {
            self.affectable = affectable;
        }
        if let Some(system) = meta.system {
            self.system = system;
        }
        if let Some(excluded) = meta.excluded {
            self.excluded = excluded;
        }
    }
}

/// Optional metadata supplied with an upsert.
///
/// `None` fields leave the stored value untouched; `parents` only ever adds
/// edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub module: Option<String>,
    pub groups: Vec<String>,
    pub parents: Vec<String>,
    pub affectable: Option<bool>,
    pub system: Option<bool>,
    pub excluded: Option<bool>,
}

/// Trim and lowercase a permission key.
///
/// # Errors
/// - [`IamError::InvalidKey`] if nothing is left after trimming.
pub fn normalize_key(key: &str) -> IamResult<String> {
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return Err(IamError::InvalidKey(key));
    }
    Ok(key)
}

/// Normalize group tags: lowercase, collapse whitespace into `-`, drop
/// empties and duplicates while keeping first-seen order.
pub fn normalize_groups<I, S>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for group in groups {
        let normalized = group
            .as_ref()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        if normalized.is_empty() || out.contains(&normalized) {
            continue;
        }
        out.push(normalized);
    }
    out
}

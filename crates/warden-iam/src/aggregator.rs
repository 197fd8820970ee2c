//! Role → permission aggregation.
//!
//! # Purpose
//! Resolves the caller's role names into the closed set of permissions
//! reachable from those roles, following `children` edges.
//!
//! # Key invariants
//! - An empty role list means `["guest"]`.
//! - Unknown role names contribute nothing and are not an error.
//! - The result is computed on every call; nothing is cached between
//!   requests because roles and the grant graph can change at any time.
use crate::{AuthorizationContext, IamCatalog, IamResult, PermissionId, normalize_roles};

pub struct RoleAggregator<'a, C: ?Sized> {
    catalog: &'a C,
}

impl<'a, C: IamCatalog + ?Sized> RoleAggregator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Build the authorization context for a caller holding `roles`.
    ///
    /// # Errors
    /// - Propagates catalog read failures; callers must treat them as a
    ///   denial.
    pub fn permissions_for_roles<S: AsRef<str>>(
        &self,
        roles: &[S],
    ) -> IamResult<AuthorizationContext> {
        let roles = normalize_roles(roles);
        let found = self.catalog.roles_by_names(&roles)?;

        let mut roots: Vec<PermissionId> = Vec::new();
        for role in &found {
            for id in &role.permissions {
                if !roots.contains(id) {
                    roots.push(*id);
                }
            }
        }

        let permissions = self.catalog.resolve_children(&roots)?;
        tracing::trace!(
            roles = ?roles,
            known_roles = found.len(),
            permissions = permissions.len(),
            "aggregated role permissions"
        );
        Ok(AuthorizationContext::new(roles, permissions))
    }
}

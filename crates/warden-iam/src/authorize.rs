//! Per-request authorization decision.
//!
//! # Purpose
//! Decides whether a caller's aggregated permissions authorize one concrete
//! method + path, and picks the denial class when they do not.
//!
//! # Decision order
//! 1. Optional scope narrowing: keep only whitelisted keys, then pull in the
//!    direct children of what was kept.
//! 2. Match: a held, non-excluded entry governs the request and (when the
//!    route declares required keys) carries one of them → allow.
//! 3. The full registry has no non-excluded entry governing the request →
//!    not found, whoever asks.
//! 4. Anonymous caller → unauthenticated.
//! 5. Otherwise → forbidden.
//!
//! # Key invariants
//! - Excluded entries are invisible to steps 2 and 3.
//! - Entries with an unusable stored pattern are skipped with a warning.
//! - Catalog read failures are returned as errors; callers must deny.
use crate::{AuthorizationContext, IamCatalog, IamResult, Permission, PermissionId};
use std::collections::HashSet;
use std::sync::Arc;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    NotFound,
    Unauthenticated,
    Forbidden,
}

impl Denial {
    pub fn status_code(self) -> u16 {
        match self {
            Denial::NotFound => 404,
            Denial::Unauthenticated => 401,
            Denial::Forbidden => 403,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Denial::NotFound => "resource_not_found",
            Denial::Unauthenticated => "unauthenticated",
            Denial::Forbidden => "forbidden",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Denial::NotFound => "Not Found",
            Denial::Unauthenticated => "User is not signed in",
            Denial::Forbidden => "User is not authorized",
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn outcome(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny(Denial::NotFound) => "not_found",
            Decision::Deny(Denial::Unauthenticated) => "unauthenticated",
            Decision::Deny(Denial::Forbidden) => "forbidden",
        }
    }
}

/// The request being authorized.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Keys the route declares; any one of them satisfies the route.
    pub required: &'a [String],
    /// Optional whitelist that narrows the caller's permissions first.
    pub scope: Option<&'a [String]>,
}

impl<'a> AccessRequest<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Self {
            method,
            path,
            required: &[],
            scope: None,
        }
    }

    pub fn requiring(mut self, required: &'a [String]) -> Self {
        self.required = required;
        self
    }

    pub fn scoped(mut self, scope: &'a [String]) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Keep whitelisted permissions, then add the direct children of those
/// kept, taken from the caller's full permission set.
pub fn narrow_scope<S: AsRef<str>>(
    permissions: &[Arc<Permission>],
    whitelist: &[S],
) -> Vec<Arc<Permission>> {
    let wanted = |permission: &Permission| {
        whitelist
            .iter()
            .any(|key| permission.key.eq_ignore_ascii_case(key.as_ref().trim()))
    };

    let mut selected: Vec<Arc<Permission>> = permissions
        .iter()
        .filter(|permission| wanted(permission))
        .cloned()
        .collect();

    let mut present: HashSet<PermissionId> = selected.iter().map(|p| p.id).collect();
    let children: Vec<PermissionId> = selected
        .iter()
        .flat_map(|permission| permission.children.iter().copied())
        .collect();
    for child in children {
        if present.contains(&child) {
            continue;
        }
        if let Some(permission) = permissions.iter().find(|p| p.id == child) {
            present.insert(child);
            selected.push(Arc::clone(permission));
        }
    }
    selected
}

pub struct Authorizer<'a, C: ?Sized> {
    catalog: &'a C,
}

impl<'a, C: IamCatalog + ?Sized> Authorizer<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Run the decision sequence for `request`.
    ///
    /// # Errors
    /// - Catalog read failures during the existence check. The caller must
    ///   not treat an error as an allow.
    pub fn evaluate(
        &self,
        context: &AuthorizationContext,
        request: &AccessRequest<'_>,
    ) -> IamResult<Decision> {
        let narrowed;
        let candidates = match request.scope {
            Some(scope) => {
                narrowed = narrow_scope(context.permissions(), scope);
                narrowed.as_slice()
            }
            None => context.permissions(),
        };

        let granted = candidates.iter().any(|permission| {
            governs(permission, request)
                && (request.required.is_empty()
                    || request
                        .required
                        .iter()
                        .any(|key| permission.key.eq_ignore_ascii_case(key.trim())))
        });
        if granted {
            return Ok(Decision::Allow);
        }

        let registered = self.catalog.all_permissions()?;
        if !registered.iter().any(|permission| governs(permission, request)) {
            return Ok(Decision::Deny(Denial::NotFound));
        }
        if context.is_anonymous() {
            return Ok(Decision::Deny(Denial::Unauthenticated));
        }
        Ok(Decision::Deny(Denial::Forbidden))
    }

    /// Check that the caller holds `key` itself, whatever route is being
    /// served.
    ///
    /// A key that is not registered, or is excluded, answers
    /// [`Denial::NotFound`]. Otherwise a caller without it gets
    /// [`Denial::Unauthenticated`] when anonymous and [`Denial::Forbidden`]
    /// when signed in.
    ///
    /// # Errors
    /// - Catalog read failures while looking the key up.
    pub fn require(&self, context: &AuthorizationContext, key: &str) -> IamResult<Decision> {
        let key = key.trim();
        if context
            .permissions()
            .iter()
            .any(|permission| !permission.excluded && permission.key.eq_ignore_ascii_case(key))
        {
            return Ok(Decision::Allow);
        }
        let registered = self
            .catalog
            .all_permissions()?
            .iter()
            .any(|permission| !permission.excluded && permission.key.eq_ignore_ascii_case(key));
        if !registered {
            return Ok(Decision::Deny(Denial::NotFound));
        }
        if context.is_anonymous() {
            return Ok(Decision::Deny(Denial::Unauthenticated));
        }
        Ok(Decision::Deny(Denial::Forbidden))
    }
}

fn governs(permission: &Permission, request: &AccessRequest<'_>) -> bool {
    if permission.excluded {
        return false;
    }
    match permission.governs(request.method, request.path) {
        Some(hit) => hit,
        None => {
            tracing::warn!(
                key = %permission.key,
                pattern = permission.resource.as_ref().map(|r| r.as_str()).unwrap_or_default(),
                "skipping permission with unusable resource pattern"
            );
            false
        }
    }
}

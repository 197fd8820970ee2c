//! Built-in route tables, default roles and handler binding.
//!
//! # Purpose
//! Declares the server's own routes as permission-bearing route tables and
//! binds each declared permission key to the handler serving it. The engine
//! never sees handlers; it only registers keys, templates and methods.
//!
//! # Notes
//! Route templates use `:name`, `:name?` and `*`. Axum has no optional
//! parameters and needs a named wildcard, so [`mount_paths`] expands one
//! template into the concrete router paths that serve it. Compiled
//! templates accept one trailing slash, so every path except the root and
//! wildcards is mounted with and without it.
use crate::api;
use crate::app::AppState;
use axum::routing::{MethodFilter, MethodRouter, on};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use warden_iam::{HttpMethod, MethodDescriptor, RoleDefinition, RouteIndex, RouteTable};

/// Grouping key held by every caller, including guests.
pub const PUBLIC_ACCESS: &str = "vendor:users:public";
/// Grouping key for role and permission administration.
pub const ROLES_MANAGE: &str = "modules:users:roles:manage";

pub const CHECKS_OK: &str = "core:checks:ok";
pub const PROFILE_GET: &str = "users:profile:get";
pub const ROLES_LIST: &str = "administration:roles:list";
pub const ROLES_GET: &str = "administration:roles:get";
pub const ROLES_CREATE: &str = "administration:roles:create";
pub const ROLES_UPDATE: &str = "administration:roles:update";
pub const IAMS_LIST: &str = "administration:iams:list";

pub fn builtin_tables() -> Vec<RouteTable> {
    let core = RouteTable::new("").module("core").route(
        "/ok",
        HttpMethod::Get,
        MethodDescriptor::new(CHECKS_OK)
            .title("Liveness check")
            .parents([PUBLIC_ACCESS])
            .affectable(false),
    );

    let users = RouteTable::new("").module("users").route(
        "/me",
        HttpMethod::Get,
        MethodDescriptor::new(PROFILE_GET).title("Current user profile"),
    );

    let roles = RouteTable::new("/roles")
        .module("users")
        .route(
            "/",
            HttpMethod::Get,
            MethodDescriptor::new(ROLES_LIST)
                .title("Get available roles")
                .parents([ROLES_MANAGE]),
        )
        .route(
            "/",
            HttpMethod::Post,
            MethodDescriptor::new(ROLES_CREATE)
                .title("Create a role")
                .parents([ROLES_MANAGE]),
        )
        .route(
            "/:roleId",
            HttpMethod::Get,
            MethodDescriptor::new(ROLES_GET)
                .title("Get a role by id")
                .parents([ROLES_MANAGE]),
        )
        .route(
            "/:roleId",
            HttpMethod::Put,
            MethodDescriptor::new(ROLES_UPDATE)
                .title("Update a role")
                .parents([ROLES_MANAGE]),
        );

    let iams = RouteTable::new("/iams").module("users").route(
        "/",
        HttpMethod::Get,
        MethodDescriptor::new(IAMS_LIST)
            .title("List registered permissions")
            .parents([ROLES_MANAGE]),
    );

    vec![core, users, roles, iams]
}

pub fn default_roles() -> Vec<RoleDefinition> {
    vec![
        RoleDefinition::new("guest")
            .title("Guest role")
            .description("Role given to any unauthenticated user, or users without any role.")
            .permissions([PUBLIC_ACCESS])
            .protected(),
        RoleDefinition::new("user")
            .title("User role")
            .description("Default role of signed-in users.")
            .permissions([PUBLIC_ACCESS, PROFILE_GET])
            .protected(),
        RoleDefinition::new("admin")
            .title("Admin role")
            .description("Administrators of the application.")
            .permissions([PUBLIC_ACCESS, PROFILE_GET, ROLES_MANAGE])
            .protected(),
    ]
}

/// Handler serving `key`, restricted to `method`.
pub fn handler_for(key: &str, method: HttpMethod) -> Option<MethodRouter<AppState>> {
    let filter = method_filter(method);
    let router = match key {
        CHECKS_OK => on(filter, api::checks::ok),
        PROFILE_GET => on(filter, api::profile::me),
        ROLES_LIST => on(filter, api::roles::list_roles),
        ROLES_GET => on(filter, api::roles::get_role),
        ROLES_CREATE => on(filter, api::roles::create_role),
        ROLES_UPDATE => on(filter, api::roles::update_role),
        IAMS_LIST => on(filter, api::iams::list_iams),
        _ => return None,
    };
    Some(router)
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::All => MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE)
            .or(MethodFilter::PATCH)
            .or(MethodFilter::OPTIONS),
    }
}

/// Router paths serving `template`.
pub fn mount_paths(template: &str) -> Vec<String> {
    let mut paths = vec![String::new()];
    for segment in template.split('/').filter(|segment| !segment.is_empty()) {
        if segment == "*" {
            paths.iter_mut().for_each(|path| path.push_str("/*rest"));
            continue;
        }
        if let Some(name) = segment
            .strip_prefix(':')
            .and_then(|name| name.strip_suffix('?'))
        {
            let with: Vec<String> = paths.iter().map(|path| format!("{path}/:{name}")).collect();
            paths.extend(with);
            continue;
        }
        paths.iter_mut().for_each(|path| {
            path.push('/');
            path.push_str(segment);
        });
    }
    let mut slashed = Vec::new();
    for path in &mut paths {
        if path.is_empty() {
            path.push('/');
        } else if !path.ends_with("/*rest") {
            slashed.push(format!("{path}/"));
        }
    }
    paths.extend(slashed);
    paths.sort();
    paths.dedup();
    paths
}

/// Method routers for every mounted path of `index`.
///
/// Excluded routes and keys without a handler are left unmounted; requests
/// for them reach the fallback through the authorization middleware.
pub fn mount(index: &RouteIndex) -> Vec<(String, MethodRouter<AppState>)> {
    let mut mounted: BTreeMap<String, (MethodRouter<AppState>, Vec<HttpMethod>)> =
        BTreeMap::new();

    for (template, method, entry) in index.iter() {
        if entry.excluded {
            tracing::info!(template, method = %method, "excluded route left unmounted");
            continue;
        }
        let Some(router) = entry
            .required
            .iter()
            .find_map(|key| handler_for(key, method))
        else {
            tracing::debug!(template, method = %method, "no handler bound");
            continue;
        };

        for path in mount_paths(template) {
            match mounted.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert((router.clone(), vec![method]));
                }
                Entry::Occupied(mut slot) => {
                    let (existing, methods) = slot.get_mut();
                    if methods.contains(&method)
                        || methods.contains(&HttpMethod::All)
                        || method == HttpMethod::All
                    {
                        tracing::warn!(
                            path = %slot.key(),
                            method = %method,
                            "overlapping handler left unmounted"
                        );
                        continue;
                    }
                    let current = std::mem::take(existing);
                    *existing = current.merge(router.clone());
                    methods.push(method);
                }
            }
        }
    }

    mounted
        .into_iter()
        .map(|(path, (router, _))| (path, router))
        .collect()
}

//! Boot-time permission registration.
//!
//! # Purpose
//! Loads operator exclusions and extra route tables, registers every table
//! into a fresh engine, imports stored permission records and seeds the
//! default roles.
//!
//! # Notes
//! Any failure here aborts startup; the server never runs with a partially
//! registered route set.
use crate::config::AppConfig;
use crate::routes;
use anyhow::Context;
use std::sync::Arc;
use warden_iam::{
    ExclusionList, Iam, PermissionRecord, RouteIndex, RouteTable, import_permissions,
    register_tables, seed_roles,
};

pub struct Bootstrapped {
    pub iam: Arc<Iam>,
    pub routes: RouteIndex,
}

pub fn bootstrap(config: &AppConfig) -> anyhow::Result<Bootstrapped> {
    let exclusions = ExclusionList::from_file(&config.exclude_file).with_context(|| {
        format!("read exclude file: {}", config.exclude_file.display())
    })?;
    if !exclusions.is_empty() {
        tracing::info!(
            file = %config.exclude_file.display(),
            keys = exclusions.len(),
            "permission exclusions loaded"
        );
    }

    let mut tables = routes::builtin_tables();
    for path in &config.route_files {
        let table = RouteTable::from_file(path)
            .with_context(|| format!("load route table: {}", path.display()))?;
        tables.push(table);
    }

    let iam = Arc::new(Iam::new());
    let routes = register_tables(&iam, &tables, &config.api_prefix, &exclusions)
        .context("register route tables")?;

    for path in &config.permission_files {
        let records = PermissionRecord::list_from_file(path)
            .with_context(|| format!("load permission records: {}", path.display()))?;
        let imported = import_permissions(&iam, &records)
            .with_context(|| format!("import permission records: {}", path.display()))?;
        tracing::info!(file = %path.display(), imported, "permission records imported");
    }

    let roles = seed_roles(&iam, &routes::default_roles()).context("seed default roles")?;
    tracing::info!(
        roles = roles.len(),
        permissions = iam.registry().len(),
        routes = routes.len(),
        "permission engine ready"
    );

    Ok(Bootstrapped { iam, routes })
}

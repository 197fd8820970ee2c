//! Declarative route tables and their registration.
//!
//! # Purpose
//! A route table groups route descriptors under a common prefix. Each
//! descriptor names a path template and, per HTTP method, the permission
//! key guarding it plus metadata. Registering a table compiles every
//! template, upserts one permission per (template, method) and records the
//! required keys in a [`RouteIndex`] the HTTP layer consults per request.
//!
//! # Key invariants
//! - Full template = (`is_global` ? "" : application prefix) + table prefix
//!   + route path.
//! - Registration is idempotent: re-registering a table updates the same
//!   permissions instead of adding new ones.
//! - A template that does not compile aborts registration.
//!
//! # Examples
//! ```rust
//! use warden_iam::{ExclusionList, Iam, RouteTable, register_tables};
//!
//! let table = RouteTable::from_yaml_str(r#"
//! prefix: /users
//! routes:
//!   - path: /
//!     methods:
//!       get:
//!         iam: users:admin:list
//!         title: List users
//! "#).unwrap();
//!
//! let iam = Iam::new();
//! let index = register_tables(&iam, &[table], "/api", &ExclusionList::new()).unwrap();
//! let entry = index.lookup("/api/users", "GET").unwrap();
//! assert_eq!(entry.required, vec!["users:admin:list".to_string()]);
//! ```
use crate::{
    ExclusionList, HttpMethod, Iam, IamError, IamResult, PermissionMeta, ResourcePattern,
    normalize_key, normalize_template,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteTable {
    #[serde(default)]
    pub prefix: String,
    /// Global tables are mounted without the application prefix.
    #[serde(default)]
    pub is_global: bool,
    #[serde(default)]
    pub module: Option<String>,
    /// Keys that narrow the caller's permissions for every route of the
    /// table before matching.
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    #[serde(default)]
    pub methods: BTreeMap<HttpMethod, MethodDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MethodDescriptor {
    #[serde(alias = "iam")]
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub affectable: Option<bool>,
    #[serde(default)]
    pub system: Option<bool>,
}

impl MethodDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn affectable(mut self, affectable: bool) -> Self {
        self.affectable = Some(affectable);
        self
    }
}

impl RouteTable {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            is_global: false,
            module: None,
            scope: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn route(
        mut self,
        path: impl Into<String>,
        method: HttpMethod,
        descriptor: MethodDescriptor,
    ) -> Self {
        let path = path.into();
        match self.routes.iter_mut().find(|route| route.path == path) {
            Some(route) => {
                route.methods.insert(method, descriptor);
            }
            None => self.routes.push(RouteDescriptor {
                path,
                methods: BTreeMap::from([(method, descriptor)]),
            }),
        }
        self
    }

    /// Parse a table from YAML.
    ///
    /// # Errors
    /// - [`IamError::InvalidRouteTable`] on malformed YAML or a relative
    ///   table prefix.
    pub fn from_yaml_str(content: &str) -> IamResult<Self> {
        let table: RouteTable = serde_yaml::from_str(content)
            .map_err(|err| IamError::InvalidRouteTable(err.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Read a table from a YAML file. When the file does not name a module,
    /// the file stem is used.
    pub fn from_file(path: impl AsRef<Path>) -> IamResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            IamError::InvalidRouteTable(format!("{}: {err}", path.display()))
        })?;
        let mut table = Self::from_yaml_str(&content).map_err(|err| match err {
            IamError::InvalidRouteTable(reason) => {
                IamError::InvalidRouteTable(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        if table.module.is_none() {
            table.module = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string);
        }
        Ok(table)
    }

    fn validate(&self) -> IamResult<()> {
        if !self.prefix.is_empty() && !self.prefix.starts_with('/') {
            return Err(IamError::InvalidRouteTable(format!(
                "table prefix {:?} must start with '/'",
                self.prefix
            )));
        }
        Ok(())
    }

    fn full_prefix(&self, app_prefix: &str) -> String {
        if self.is_global {
            self.prefix.clone()
        } else {
            format!("{app_prefix}{}", self.prefix)
        }
    }
}

/// What the HTTP layer needs to know about one (template, method) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Any one of these keys satisfies the route.
    pub required: Vec<String>,
    /// Every key declared for the pair is excluded; handlers stay unmounted.
    pub excluded: bool,
    pub scope: Option<Vec<String>>,
}

/// Registered routes keyed by full template, then method.
#[derive(Debug, Clone, Default)]
pub struct RouteIndex {
    routes: BTreeMap<String, BTreeMap<HttpMethod, RouteEntry>>,
}

impl RouteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(
        &mut self,
        template: String,
        method: HttpMethod,
        key: String,
        excluded: bool,
        scope: &[String],
    ) {
        let entry = self
            .routes
            .entry(template)
            .or_default()
            .entry(method)
            .or_insert_with(|| RouteEntry {
                required: Vec::new(),
                excluded: true,
                scope: None,
            });
        if !entry.required.contains(&key) {
            entry.required.push(key);
        }
        entry.excluded &= excluded;
        let scope: Vec<String> = scope
            .iter()
            .filter_map(|key| normalize_key(key).ok())
            .collect();
        if !scope.is_empty() {
            let merged = entry.scope.get_or_insert_with(Vec::new);
            for key in scope {
                if !merged.contains(&key) {
                    merged.push(key);
                }
            }
        }
    }

    /// Required keys for a request on `template` with `method`.
    ///
    /// HEAD is looked up as GET; an entry bound to `all` answers for any
    /// method without a more specific entry.
    pub fn lookup(&self, template: &str, method: &str) -> Option<&RouteEntry> {
        let methods = self.routes.get(template)?;
        HttpMethod::from_request(method)
            .and_then(|method| methods.get(&method))
            .or_else(|| methods.get(&HttpMethod::All))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, HttpMethod, &RouteEntry)> {
        self.routes.iter().flat_map(|(template, methods)| {
            methods
                .iter()
                .map(move |(method, entry)| (template.as_str(), *method, entry))
        })
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Register every table into `iam` and build the route index.
///
/// Descriptors matched by `exclusions` are still registered, flagged
/// `excluded`.
///
/// # Errors
/// - [`IamError::PatternCompile`] when a template does not compile.
/// - [`IamError::InvalidRouteTable`] for a relative table prefix.
/// - [`IamError::InvalidKey`] for a blank permission key.
pub fn register_tables(
    iam: &Iam,
    tables: &[RouteTable],
    app_prefix: &str,
    exclusions: &ExclusionList,
) -> IamResult<RouteIndex> {
    let mut index = RouteIndex::new();
    let mut registered = 0usize;

    for table in tables {
        table.validate()?;
        let prefix = table.full_prefix(app_prefix);
        for route in &table.routes {
            let template = normalize_template(&route.path, Some(&prefix))?;
            let pattern = ResourcePattern::compile(&route.path, Some(&prefix))?;

            for (method, descriptor) in &route.methods {
                let key = normalize_key(&descriptor.key)?;
                let exclusion = exclusions.check(&key, &descriptor.parents);
                if let Some(exclusion) = &exclusion {
                    tracing::warn!(
                        key = %key,
                        template = %template,
                        reason = exclusion.reason.as_str(),
                        matched = %exclusion.matched,
                        "permission excluded by operator"
                    );
                }

                let meta = PermissionMeta {
                    title: descriptor.title.clone(),
                    description: descriptor.description.clone(),
                    module: table.module.clone(),
                    groups: descriptor.groups.clone(),
                    parents: descriptor.parents.clone(),
                    affectable: descriptor.affectable,
                    system: descriptor.system,
                    excluded: Some(exclusion.is_some()),
                };
                iam.registry()
                    .upsert(&key, Some(pattern.clone()), Some(*method), &meta)?;
                index.record(template.clone(), *method, key, exclusion.is_some(), &table.scope);
                registered += 1;
            }
        }
    }

    tracing::info!(
        tables = tables.len(),
        routes = registered,
        permissions = iam.registry().len(),
        "route tables registered"
    );
    Ok(index)
}

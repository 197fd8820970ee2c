//! Application server HTTP wiring.
//!
//! # Purpose
//! Builds the Axum router from the registered route index, installs the
//! authorization middleware and defines the shared application state.
//!
//! # Notes
//! The middleware is attached with `Router::layer` so it also guards the
//! fallback and method-not-allowed answers.
use crate::api;
use crate::auth::middleware::authorize;
use crate::auth::principal::IdentityResolver;
use crate::routes;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use warden_iam::{Iam, IamCatalog, RouteEntry, RouteIndex};

#[derive(Clone)]
pub struct AppState {
    pub iam: Arc<Iam>,
    /// Read seam used for authorization; the same `Iam` unless replaced.
    pub catalog: Arc<dyn IamCatalog>,
    pub routes: Arc<RouteIndex>,
    pub identity: Arc<dyn IdentityResolver>,
    /// Templates served by each mounted router path, in registration order.
    mounts: Arc<HashMap<String, Vec<String>>>,
}

impl AppState {
    pub fn new(iam: Arc<Iam>, routes: RouteIndex, identity: Arc<dyn IdentityResolver>) -> Self {
        let mut mounts: HashMap<String, Vec<String>> = HashMap::new();
        for template in routes.templates() {
            for path in routes::mount_paths(template) {
                let templates = mounts.entry(path).or_default();
                if let Some(first) = templates.first() {
                    tracing::warn!(
                        first = %first,
                        template,
                        "templates share a mounted path; their required keys are merged"
                    );
                }
                templates.push(template.to_string());
            }
        }
        Self {
            catalog: iam.clone(),
            iam,
            routes: Arc::new(routes),
            identity,
            mounts: Arc::new(mounts),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn IamCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Route templates behind a mounted router path.
    pub fn templates_for(&self, mounted: &str) -> &[String] {
        self.mounts.get(mounted).map(Vec::as_slice).unwrap_or_default()
    }

    /// Route entry guarding `method` on a mounted router path.
    ///
    /// When several templates share the path, the entries are merged: any
    /// required key of a live entry satisfies the route, the path counts as
    /// excluded only when every entry is, and a scope applies only when
    /// every entry carries one.
    pub fn route_entry(&self, mounted: &str, method: &str) -> Option<RouteEntry> {
        let entries: Vec<&RouteEntry> = self
            .templates_for(mounted)
            .iter()
            .filter_map(|template| self.routes.lookup(template, method))
            .collect();
        let (first, rest) = entries.split_first()?;
        if rest.is_empty() {
            return Some((*first).clone());
        }

        let excluded = entries.iter().all(|entry| entry.excluded);
        let mut merged = RouteEntry {
            required: Vec::new(),
            excluded,
            scope: Some(Vec::new()),
        };
        for entry in entries.iter().filter(|entry| excluded || !entry.excluded) {
            for key in &entry.required {
                if !merged.required.contains(key) {
                    merged.required.push(key.clone());
                }
            }
            merged.scope = match (merged.scope.take(), entry.scope.as_ref()) {
                (Some(mut scope), Some(extra)) => {
                    for key in extra {
                        if !scope.contains(key) {
                            scope.push(key.clone());
                        }
                    }
                    Some(scope)
                }
                _ => None,
            };
        }
        Some(merged)
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    let mut router = Router::new();
    for (path, method_router) in routes::mount(&state.routes) {
        router = router.route(&path, method_router);
    }

    router
        .fallback(api::fallback)
        .layer(axum::middleware::from_fn_with_state(state.clone(), authorize))
        .layer(trace_layer)
        .with_state(state)
}

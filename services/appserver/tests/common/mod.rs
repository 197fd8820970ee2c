#![allow(dead_code)]

use appserver::app::{AppState, build_router};
use appserver::auth::principal::{Principal, StaticTokenResolver};
use appserver::routes::{builtin_tables, default_roles};
use axum::body::Body;
use axum::routing::RouterIntoService;
use std::sync::Arc;
use warden_iam::{ExclusionList, Iam, register_tables, seed_roles};

pub const USER_TOKEN: &str = "t-user";
pub const ADMIN_TOKEN: &str = "t-admin";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn state_with_exclusions(exclusions: &ExclusionList) -> AppState {
    let iam = Arc::new(Iam::new());
    let routes = register_tables(&iam, &builtin_tables(), "/api", exclusions).expect("register");
    seed_roles(&iam, &default_roles()).expect("seed roles");
    let identity = StaticTokenResolver::new()
        .with_principal(USER_TOKEN, Principal::new("bob", ["user"]))
        .with_principal(ADMIN_TOKEN, Principal::new("alice", ["admin"]));
    AppState::new(iam, routes, Arc::new(identity))
}

pub fn state() -> AppState {
    state_with_exclusions(&ExclusionList::new())
}

pub fn app(state: AppState) -> RouterIntoService<Body, ()> {
    build_router(state).into_service()
}

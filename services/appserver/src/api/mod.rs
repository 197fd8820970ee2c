//! Application server HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules, shared error/response types, the fallback
//! handler for paths nothing is mounted on, and the per-handler permission
//! check.
pub mod checks;
pub mod error;
pub mod iams;
pub mod profile;
pub mod roles;
pub mod types;

use crate::api::error::{ApiError, api_forbidden, api_internal, api_not_found, api_unauthorized};
use crate::app::AppState;
use warden_iam::{AuthorizationContext, Authorizer, Decision, Denial};

/// Requests that reach the fallback already passed authorization; the path
/// simply has no handler.
pub async fn fallback() -> ApiError {
    api_not_found(Denial::NotFound.message())
}

/// Require the caller to hold `key`, independently of the route's own keys.
///
/// Unknown or excluded keys answer 404, missing ones 401/403.
pub(crate) fn require_permission(
    state: &AppState,
    context: &AuthorizationContext,
    key: &str,
) -> Result<(), ApiError> {
    let decision = Authorizer::new(state.catalog.as_ref())
        .require(context, key)
        .map_err(|err| api_internal("failed to check permission", &err))?;
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(Denial::NotFound) => {
            Err(api_not_found(&format!("permission {key} not found")))
        }
        Decision::Deny(Denial::Unauthenticated) => {
            Err(api_unauthorized(Denial::Unauthenticated.message()))
        }
        Decision::Deny(Denial::Forbidden) => Err(api_forbidden(&format!(
            "permission {key} is required to continue"
        ))),
    }
}

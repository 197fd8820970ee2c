//! Per-request authorization middleware.
//!
//! # Purpose
//! Resolves the caller, builds its authorization context from its roles and
//! asks the engine whether the concrete method + path may be invoked.
//!
//! # Key invariants
//! - Runs before every handler and before the fallback.
//! - Catalog failures answer 500 and never reach a handler.
//! - Bearer tokens are never logged.
use crate::api::error::{ApiError, api_internal};
use crate::app::AppState;
use crate::auth::principal::extract_bearer;
use crate::observability::record_decision;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use warden_iam::{AccessRequest, Authorizer, Decision, RoleAggregator};

pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = state.identity.resolve(extract_bearer(request.headers()));
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let entry = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|matched| state.route_entry(matched.as_str(), &method));
    let required: &[String] = entry
        .as_ref()
        .map(|entry| entry.required.as_slice())
        .unwrap_or_default();

    let context = match RoleAggregator::new(state.catalog.as_ref())
        .permissions_for_roles(&principal.roles)
    {
        Ok(context) => context,
        Err(err) => {
            record_decision("error");
            return api_internal("authorization unavailable", &err).into_response();
        }
    };

    let mut access = AccessRequest::new(&method, &path).requiring(required);
    if let Some(scope) = entry.as_ref().and_then(|entry| entry.scope.as_deref()) {
        access = access.scoped(scope);
    }

    match Authorizer::new(state.catalog.as_ref()).evaluate(&context, &access) {
        Ok(Decision::Allow) => {
            record_decision(Decision::Allow.outcome());
            tracing::debug!(
                method = %method,
                path = %path,
                subject = %principal.subject,
                "request authorized"
            );
            request.extensions_mut().insert(context);
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Ok(decision @ Decision::Deny(denial)) => {
            record_decision(decision.outcome());
            tracing::info!(
                method = %method,
                path = %path,
                subject = %principal.subject,
                roles = ?context.roles(),
                outcome = decision.outcome(),
                "request denied"
            );
            ApiError::from(denial).into_response()
        }
        Err(err) => {
            record_decision("error");
            api_internal("authorization unavailable", &err).into_response()
        }
    }
}

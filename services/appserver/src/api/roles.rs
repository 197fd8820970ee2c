//! Role administration handlers.
//!
//! # Purpose
//! Lists, shows, creates and edits roles. Full permission metadata is only
//! rendered for callers who may list permissions themselves, and attaching
//! permissions to a role requires that same listing permission.
use crate::api::error::{ApiError, api_conflict, api_internal, api_not_found, api_validation_error};
use crate::api::require_permission;
use crate::api::types::{ListRolesResponse, RoleCreateRequest, RoleUpdateRequest, RoleView};
use crate::app::AppState;
use crate::routes::IAMS_LIST;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use warden_iam::{AuthorizationContext, IamError};

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(context): Extension<AuthorizationContext>,
) -> Json<ListRolesResponse> {
    let with_details = context.holds(IAMS_LIST);
    let registry = state.iam.registry();
    let items = state
        .iam
        .roles()
        .list()
        .iter()
        .map(|role| RoleView::new(role, registry, with_details))
        .collect();
    Json(ListRolesResponse { items })
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Extension(context): Extension<AuthorizationContext>,
) -> Result<Json<RoleView>, ApiError> {
    let role = state
        .iam
        .roles()
        .get(&role_id)
        .ok_or_else(|| api_not_found("role not found"))?;
    Ok(Json(RoleView::new(
        &role,
        state.iam.registry(),
        context.holds(IAMS_LIST),
    )))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(context): Extension<AuthorizationContext>,
    Json(body): Json<RoleCreateRequest>,
) -> Result<(StatusCode, Json<RoleView>), ApiError> {
    if !body.permissions.is_empty() {
        require_permission(&state, &context, IAMS_LIST)?;
    }
    let role = state
        .iam
        .create_role(&body.into_definition())
        .map_err(|err| match err {
            IamError::RoleExists(_) => api_conflict("role_already_exists", "role already exists"),
            IamError::InvalidKey(_) => api_validation_error("role name must not be blank"),
            other => api_internal("failed to create role", &other),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(RoleView::new(
            &role,
            state.iam.registry(),
            context.holds(IAMS_LIST),
        )),
    ))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Extension(context): Extension<AuthorizationContext>,
    Json(body): Json<RoleUpdateRequest>,
) -> Result<Json<RoleView>, ApiError> {
    if body.permissions.is_some() {
        require_permission(&state, &context, IAMS_LIST)?;
    }
    let role = state
        .iam
        .update_role(&role_id, &body.into_changes())
        .map_err(|err| match err {
            IamError::UnknownRole(_) => api_not_found("role not found"),
            other => api_internal("failed to update role", &other),
        })?;
    Ok(Json(RoleView::new(
        &role,
        state.iam.registry(),
        context.holds(IAMS_LIST),
    )))
}

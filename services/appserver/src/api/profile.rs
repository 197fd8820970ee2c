//! Current caller profile.
use crate::api::types::ProfileResponse;
use crate::auth::principal::Principal;
use axum::{Extension, Json};
use warden_iam::AuthorizationContext;

/// Echo the resolved principal and the permission keys it holds.
pub async fn me(
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<AuthorizationContext>,
) -> Json<ProfileResponse> {
    let mut permissions: Vec<String> = context.keys().into_iter().map(str::to_string).collect();
    permissions.sort();
    Json(ProfileResponse {
        anonymous: principal.is_anonymous(),
        subject: principal.subject,
        display_name: principal.display_name,
        roles: context.roles().to_vec(),
        permissions,
    })
}

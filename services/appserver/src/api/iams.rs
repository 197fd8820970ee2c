//! Permission listing.
use crate::api::types::{ListPermissionsResponse, PermissionView};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

pub async fn list_iams(State(state): State<AppState>) -> Json<ListPermissionsResponse> {
    let registry = state.iam.registry();
    let items = registry
        .find_all()
        .iter()
        .map(|permission| PermissionView::new(permission, registry))
        .collect();
    Json(ListPermissionsResponse { items })
}

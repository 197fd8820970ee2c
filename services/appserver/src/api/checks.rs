//! Liveness check.
use crate::api::types::HealthStatus;
use axum::Json;

pub async fn ok() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

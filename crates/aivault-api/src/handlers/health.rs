use axum::Json;
use chrono::Utc;

use crate::dto::HealthResponse;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().timestamp(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

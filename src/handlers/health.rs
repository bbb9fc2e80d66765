//! Health check handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "turnstile")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "2025-01-15T10:30:00Z")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    #[schema(example = "ready")]
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessChecks {
    pub store: ComponentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentStatus {
    #[schema(example = "up")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 5)]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Connection refused")]
    pub error: Option<String>,
}

impl ComponentStatus {
    pub fn up(latency_ms: u64) -> Self {
        Self {
            status: "up".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "turnstile".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Simple health check", content_type = "text/plain")
    )
)]
pub async fn health_check_simple() -> &'static str {
    "OK"
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let store_status = match check_store(&state).await {
        Ok(latency_ms) => ComponentStatus::up(latency_ms),
        Err(e) => ComponentStatus::down(e),
    };

    let store_healthy = store_status.status == "up";

    let response = ReadinessResponse {
        status: if store_healthy {
            "ready".to_string()
        } else {
            "not_ready".to_string()
        },
        checks: ReadinessChecks {
            store: store_status,
        },
    };

    if store_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_store(state: &AppState) -> Result<u64, String> {
    let start = std::time::Instant::now();

    state
        .stores
        .members
        .list(None)
        .await
        .map_err(|e| format!("Store query failed: {}", e))?;

    let latency = start.elapsed().as_millis() as u64;
    Ok(latency)
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn live_check() -> StatusCode {
    StatusCode::OK
}

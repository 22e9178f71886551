//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1760745600000_i64)]
    pub timestamp_ms: i64,
}

/// Health check endpoint
///
/// Pings PostgreSQL at most once per interval. Failure details stay in the logs.
///
/// - Healthy: 200 OK + {code: "OK", data: {timestamp_ms}}
/// - Unhealthy: 503 Service Unavailable + {code: "UNAVAILABLE", msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (
            status = 200,
            description = "Service healthy",
            body = HealthResponse,
            content_type = "application/json"
        ),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    static LAST_CHECK_MS: AtomicI64 = AtomicI64::new(0);
    const CHECK_INTERVAL_MS: i64 = 5000;

    let now_ms = chrono::Utc::now().timestamp_millis();

    let healthy = if now_ms - LAST_CHECK_MS.load(Ordering::Relaxed) > CHECK_INTERVAL_MS {
        LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
        match &state.db {
            Some(db) => match db.health_check().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
                    false
                }
            },
            None => true,
        }
    } else {
        true
    };

    if healthy {
        (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now_ms,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: "UNAVAILABLE".to_string(),
                msg: "unavailable".to_string(),
                data: None,
            }),
        )
    }
}

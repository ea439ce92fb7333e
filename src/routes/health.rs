/**
 * Health Routes
 * Liveness, readiness and a detailed report including the database probe
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
    pub uploads: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn database_check(state: &AppState) -> ServiceCheck {
    let probe = tokio::time::timeout(
        state.store.timeout(),
        crate::db::health_check(state.store.pool()),
    )
    .await;

    match probe {
        Ok(Ok(duration)) => ServiceCheck {
            status: "healthy".to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Ok(Err(e)) => {
            tracing::error!("Database health check failed: {}", e);
            ServiceCheck {
                status: "unhealthy".to_string(),
                response_time: None,
                error: Some("database unavailable".to_string()),
            }
        }
        Err(_) => ServiceCheck {
            status: "unhealthy".to_string(),
            response_time: None,
            error: Some("database probe timed out".to_string()),
        },
    }
}

async fn uploads_check(state: &AppState) -> ServiceCheck {
    match tokio::fs::metadata(state.uploads.root()).await {
        Ok(meta) if meta.is_dir() => ServiceCheck {
            status: "healthy".to_string(),
            response_time: None,
            error: None,
        },
        _ => ServiceCheck {
            status: "unhealthy".to_string(),
            response_time: None,
            error: Some("upload directory missing".to_string()),
        },
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Detailed health with all checks
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let database = database_check(&state).await;
    let uploads = uploads_check(&state).await;

    let status = if database.status == "healthy" && uploads.status == "healthy" {
        "ok"
    } else {
        "degraded"
    };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        checks: HealthChecks { database, uploads },
    })
}

/// GET /health/ready - 503 until the database answers
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let database = database_check(&state).await;

    if database.status == "healthy" {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                timestamp: Utc::now(),
                reason: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not ready".to_string(),
                timestamp: Utc::now(),
                reason: database.error,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    use crate::state::test_support::test_state;

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        let (state, _temp) = test_state().await;
        let (status, body) =
            get_json::<SimpleHealthResponse>(crate::create_app(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_detailed_reports_checks() {
        init_start_time();
        let (state, _temp) = test_state().await;
        state.uploads.initialize().await.unwrap();

        let (status, body) =
            get_json::<DetailedHealthResponse>(crate::create_app(state), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.database.status, "healthy");
        assert_eq!(body.checks.uploads.status, "healthy");
    }

    #[tokio::test]
    async fn test_health_detailed_degraded_without_upload_dir() {
        let (state, _temp) = test_state().await;
        let (_, body) =
            get_json::<DetailedHealthResponse>(crate::create_app(state), "/health/detailed").await;
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.uploads.status, "unhealthy");
    }

    #[tokio::test]
    async fn test_health_ready_returns_ready() {
        let (state, _temp) = test_state().await;
        let (status, body) =
            get_json::<ReadyResponse>(crate::create_app(state), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
    }

    #[tokio::test]
    async fn test_health_ready_unavailable_when_pool_closed() {
        let (state, _temp) = test_state().await;
        state.store.pool().close().await;

        let (status, body) =
            get_json::<ReadyResponse>(crate::create_app(state), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "not ready");
    }
}

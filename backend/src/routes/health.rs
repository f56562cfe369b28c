//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness check (checks storage)
//! - /health/live - Liveness check (always returns OK if server is running)

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub storage: CheckStatus,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Readiness check; 503 while storage is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let storage_check = match state.accounts().health_check().await {
        Ok(()) => CheckStatus {
            status: "healthy".to_string(),
            message: None,
        },
        Err(e) => CheckStatus {
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
        },
    };

    let is_healthy = storage_check.status == "healthy";

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(HealthChecks {
            storage: storage_check,
        }),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness check
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::routes::create_router;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let app = create_router(AppState::in_memory(AppConfig::default()));
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[tokio::test]
    async fn test_readiness_with_in_memory_store() {
        let state = AppState::in_memory(AppConfig::default());
        let response = readiness_check(State(state)).await.ok().unwrap();
        assert_eq!(response.status, "ready");
    }

    #[tokio::test]
    async fn test_health_routes_served_without_database() {
        for (uri, marker) in [
            ("/health", "healthy"),
            ("/health/live", "alive"),
            ("/health/ready", "ready"),
        ] {
            let (status, body) = get_body(uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            let body: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body["status"], marker, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_ready_route_reports_storage_check() {
        let (_, body) = get_body("/health/ready").await;
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["checks"]["storage"]["status"], "healthy");
        assert!(body["checks"]["storage"].get("message").is_none());
    }

    #[tokio::test]
    async fn test_api_root_route() {
        let (status, body) = get_body("/api/v1/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Blog API v1");
    }
}

/**
 * Health Routes
 * Endpoints for checking backend health status
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
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
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: HealthChecks,
}

/// Health checks for all services
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
    pub mail: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_store(state: &AppState) -> ServiceCheck {
    let backend = Some(state.store.kind().to_string());
    match state.store.ping().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            backend,
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => ServiceCheck {
            status: "unhealthy".to_string(),
            backend,
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

fn check_mail(state: &AppState) -> ServiceCheck {
    let status = match state.mailer {
        crate::mail::Mailer::Disabled => "disabled",
        _ => "configured",
    };
    ServiceCheck {
        status: status.to_string(),
        backend: None,
        response_time: None,
        error: None,
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
    let database = check_store(&state).await;

    // The process answers, so the overall status stays "ok"; per-check
    // status carries the detail.
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        environment: state.config.environment.clone(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        checks: HealthChecks {
            database,
            mail: check_mail(&state),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/database - Database health check
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(check_store(&state).await))
}

/// GET /health/ready - Readiness check, 503 while the store is unreachable
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.started_at.elapsed().as_secs();

    let (status, response) = match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            ReadyResponse {
                status: "ready".to_string(),
                timestamp: Utc::now(),
                uptime,
                reason: None,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ReadyResponse {
                    status: "not ready".to_string(),
                    timestamp: Utc::now(),
                    uptime,
                    reason: Some("Document store is not reachable".to_string()),
                },
            )
        }
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{test_state, test_state_with_outbox};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_ping))
            .route("/health/detailed", get(health_detailed))
            .route("/health/database", get(health_database))
            .route("/health/ready", get(health_ready))
            .with_state(state)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[test]
    fn test_service_check_skips_empty_fields() {
        let check = ServiceCheck {
            status: "healthy".to_string(),
            backend: None,
            response_time: Some(10),
            error: None,
        };
        let json = serde_json::to_string(&check).unwrap();
        assert_eq!(json, r#"{"status":"healthy","responseTime":10}"#);
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        let (status, body) =
            get_json::<SimpleHealthResponse>(test_router(test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_database_reports_memory_store() {
        let (status, body) =
            get_json::<ServiceCheck>(test_router(test_state()), "/health/database").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.backend.as_deref(), Some("memory"));
    }

    #[tokio::test]
    async fn test_health_detailed_reports_mail() {
        let (status, body) =
            get_json::<DetailedHealthResponse>(test_router(test_state()), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.environment, "development");
        assert_eq!(body.checks.mail.status, "disabled");

        let (state, _outbox) = test_state_with_outbox();
        let (_, body) =
            get_json::<DetailedHealthResponse>(test_router(state), "/health/detailed").await;
        assert_eq!(body.checks.mail.status, "configured");
    }

    #[tokio::test]
    async fn test_health_ready_returns_ready() {
        let (status, body) =
            get_json::<ReadyResponse>(test_router(test_state()), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert!(body.reason.is_none());
    }
}

//! Health check endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::quote::QuoteFilter;

use super::state::AppState;

/// Health response with optional component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// API info served at /api
#[derive(Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Simple liveness probe
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Alias liveness probe
pub async fn live_check() -> impl IntoResponse {
    health_check().await
}

/// Readiness probe verifying the storage-backed services answer
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let mut checks = Vec::new();
    let mut overall = HealthStatus::Healthy;

    let keys_check = match state.api_key_service.count().await {
        Ok(_) => HealthCheck {
            name: "api_keys".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: "api_keys".to_string(),
            status: HealthStatus::Degraded,
            message: Some(e.to_string()),
        },
    };
    if keys_check.status != HealthStatus::Healthy {
        overall = HealthStatus::Degraded;
    }
    checks.push(keys_check);

    let quotes_check = match state
        .quote_service
        .list(&QuoteFilter::default(), 0, 1)
        .await
    {
        Ok(_) => HealthCheck {
            name: "quotes".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: "quotes".to_string(),
            status: HealthStatus::Degraded,
            message: Some(e.to_string()),
        },
    };
    if quotes_check.status != HealthStatus::Healthy {
        overall = HealthStatus::Degraded;
    }
    checks.push(quotes_check);

    let status_code = match overall {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status: overall,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    (status_code, Json(response))
}

/// GET /api - service identification
pub async fn api_info() -> impl IntoResponse {
    Json(ApiInfo {
        name: "Quotevault API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

//! Root banner and health checks

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub base_path: String,
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Welcome to the {}", state.settings.service_name),
        version: env!("CARGO_PKG_VERSION").to_string(),
        base_path: state.settings.base_path.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
}

/// Liveness: the process is up and serving
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: state.settings.service_name.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
    pub instance: String,
    pub uptime_secs: u64,
    pub dependencies: Dependencies,
}

#[derive(Debug, Serialize)]
pub struct Dependencies {
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrations: Option<usize>,
}

/// Health check with dependency status; 503 when the store cannot be read
pub async fn detailed_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let (store_status, registrations) = match state.store.count().await {
        Ok(count) => ("healthy", Some(count)),
        Err(err) => {
            tracing::error!(error = %err, "Store health probe failed");
            ("unhealthy", None)
        }
    };

    let status = if registrations.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let instance = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let body = DetailedHealthResponse {
        status: if status == StatusCode::OK { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        service: state.settings.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance,
        uptime_secs: state.started_at.elapsed().as_secs(),
        dependencies: Dependencies {
            store: StoreHealth {
                status: store_status.to_string(),
                backend: state.store.backend_name().to_string(),
                registrations,
            },
        },
    };

    (status, Json(body))
}

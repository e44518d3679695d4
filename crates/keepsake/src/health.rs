// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unauthenticated probe endpoints.
//!
//! - `GET /`, `GET /health`: liveness, always `{"status":"ok"}`
//! - `GET /ready`: runs every adapter's health check, 503 if one is unhealthy
//! - `GET /metrics`: Prometheus text, 404 when no recorder is installed

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use keepsake_core::{HealthStatus, KeepsakeError, PluginAdapter};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared state for the probe handlers.
#[derive(Clone, Default)]
pub struct HealthState {
    /// Adapters polled by `/ready`.
    pub adapters: Vec<Arc<dyn PluginAdapter + Send + Sync>>,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness(State(state): State<HealthState>) -> Response {
    let mut adapters = BTreeMap::new();
    let mut ready = true;

    for adapter in &state.adapters {
        let status = match adapter.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        let entry = match &status {
            HealthStatus::Healthy => json!({ "status": "healthy" }),
            HealthStatus::Degraded(reason) => json!({ "status": "degraded", "reason": reason }),
            HealthStatus::Unhealthy(reason) => {
                warn!(adapter = adapter.name(), reason = reason.as_str(), "adapter unhealthy");
                ready = false;
                json!({ "status": "unhealthy", "reason": reason })
            }
        };
        adapters.insert(adapter.name().to_string(), entry);
    }

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status = if ready { "ready" } else { "unavailable" };
    (code, Json(json!({ "status": status, "adapters": adapters }))).into_response()
}

async fn metrics(State(state): State<HealthState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves the probe router on `host:port` until `cancel` fires.
pub async fn serve(
    host: &str,
    port: u16,
    state: HealthState,
    cancel: CancellationToken,
) -> Result<(), KeepsakeError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KeepsakeError::Internal(format!("failed to bind health endpoint to {addr}: {e}")))?;

    info!("health endpoint listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| KeepsakeError::Internal(format!("health endpoint error: {e}")))
}

//! Health, metrics, and status endpoints.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::limiter::LimiterSnapshot;
use crate::metrics::RequestStats;
use crate::state::AppState;

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub zipper: String,
    pub limiter: LimiterSnapshot,
    pub requests: RequestStats,
}

/// GET /api/status - limiter occupancy and request totals
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        zipper: state.zipper_url.clone(),
        limiter: state.aggregator.limiter().snapshot(),
        requests: state.metrics.snapshot(),
    })
}

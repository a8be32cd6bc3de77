//! Render aggregation front end.
//!
//! Accepts graphite-style `/render/` requests, resolves every target glob
//! against a zipper node, renders each resolved leaf under a process-wide
//! concurrency limit, and answers with the collected series as JSON.

pub mod aggregator;
pub mod config;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod state;
pub mod zipper;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Routes served by the API, minus `/metrics` which needs the installed
/// Prometheus recorder.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/render",
            get(handlers::render_handler).post(handlers::render_form_handler),
        )
        .route(
            "/render/",
            get(handlers::render_handler).post(handlers::render_form_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/api/status", get(handlers::status_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

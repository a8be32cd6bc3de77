//! Render API Server
//!
//! Front end that fans `/render/` requests out to a zipper node.

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::Extension, routing::get};
use clap::Parser;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use render_api::config::{Args, RenderApiConfig};
use render_api::handlers;
use render_api::state::AppState;

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = match RenderApiConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            std::process::exit(1);
        }
    };

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;

    let state = match AppState::new(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "Failed to initialize application state");
            std::process::exit(1);
        }
    };

    let app = render_api::build_router(state)
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(prometheus_handle))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    info!(
        address = %config.listen_addr,
        zipper = %config.zipper_url,
        limit = config.concurrency_limit,
        timeout_secs = config.request_timeout.as_secs(),
        "Render API listening"
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

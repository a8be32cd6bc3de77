//! Application state and shared resources.

use std::sync::Arc;

use carbon_common::CarbonResult;

use crate::aggregator::RenderAggregator;
use crate::config::RenderApiConfig;
use crate::limiter::RenderLimiter;
use crate::metrics::MetricsCollector;
use crate::zipper::{ZipperBackend, ZipperClient};

/// Shared application state, built once at startup.
pub struct AppState {
    pub aggregator: RenderAggregator,
    pub metrics: MetricsCollector,
    /// Zipper address, for status output only.
    pub zipper_url: String,
}

impl AppState {
    /// Build the zipper client and the process-wide limiter from `config`.
    pub fn new(config: &RenderApiConfig) -> CarbonResult<Self> {
        let client = ZipperClient::new(&config.zipper_url, config.request_timeout)?;
        let limiter = RenderLimiter::new(config.concurrency_limit)?;

        Ok(Self::with_backend(
            Arc::new(client),
            Arc::new(limiter),
            config.zipper_url.clone(),
        ))
    }

    /// Assemble state around an existing backend and limiter.
    pub fn with_backend(
        backend: Arc<dyn ZipperBackend>,
        limiter: Arc<RenderLimiter>,
        zipper_url: String,
    ) -> Self {
        Self {
            aggregator: RenderAggregator::new(backend, limiter),
            metrics: MetricsCollector::new(),
            zipper_url,
        }
    }
}

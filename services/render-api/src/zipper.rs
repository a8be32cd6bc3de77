//! Zipper client.
//!
//! One HTTP round-trip per call, no retries. Failures are logged here and
//! returned to the caller, which decides what to drop.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use carbon_common::{CarbonError, CarbonResult};
use carbon_protocol::{decode_fetch, decode_glob, params, paths, FetchResponse, GlobResponse};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::metrics::{record_zipper_call, OP_FIND, OP_RENDER};

/// The find/render operations the aggregator needs from a zipper node.
#[async_trait]
pub trait ZipperBackend: Send + Sync {
    /// Resolve a glob pattern into concrete matches.
    async fn find(&self, pattern: &str) -> CarbonResult<GlobResponse>;

    /// Fetch one leaf's series for an absolute window given as epoch seconds.
    async fn render(&self, path: &str, from: &str, until: &str) -> CarbonResult<FetchResponse>;
}

/// HTTP + protobuf client for a single zipper endpoint.
#[derive(Debug, Clone)]
pub struct ZipperClient {
    client: Client,
    base_url: String,
}

impl ZipperClient {
    /// `base_url` is used as given, minus any trailing slash.
    pub fn new(base_url: &str, timeout: Duration) -> CarbonResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CarbonError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One round-trip: GET, status check, body read, decode.
    async fn call<T>(
        &self,
        op: &'static str,
        path: &str,
        query: &[(&str, &str)],
        decode: fn(&[u8]) -> CarbonResult<T>,
    ) -> CarbonResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let result = self.fetch(&url, query, decode).await;
        record_zipper_call(op, start.elapsed(), result.as_ref().err());
        result
    }

    async fn fetch<T>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        decode: fn(&[u8]) -> CarbonResult<T>,
    ) -> CarbonResult<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CarbonError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        decode(&body)
    }
}

fn transport_error(err: reqwest::Error) -> CarbonError {
    CarbonError::Transport(err.to_string())
}

#[async_trait]
impl ZipperBackend for ZipperClient {
    #[instrument(skip(self), level = "debug")]
    async fn find(&self, pattern: &str) -> CarbonResult<GlobResponse> {
        let query = [(params::QUERY, pattern), (params::FORMAT, params::PROTOBUF)];

        let result = self.call(OP_FIND, paths::FIND, &query, decode_glob).await;

        match &result {
            Ok(glob) => debug!(matches = glob.matches.len(), "find resolved"),
            Err(e) => warn!(pattern, error = %e, kind = e.kind(), "Find failed"),
        }
        result
    }

    #[instrument(skip(self), level = "debug")]
    async fn render(&self, path: &str, from: &str, until: &str) -> CarbonResult<FetchResponse> {
        let query = [
            (params::TARGET, path),
            (params::FORMAT, params::PROTOBUF),
            (params::FROM, from),
            (params::UNTIL, until),
        ];

        let result = self.call(OP_RENDER, paths::RENDER, &query, decode_fetch).await;

        if let Err(e) = &result {
            warn!(path, error = %e, kind = e.kind(), "Render failed");
        }
        result
    }
}

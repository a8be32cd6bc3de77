//! Stub zipper node for end-to-end tests.
//!
//! Serves `/metrics/find/` and `/render/` over real HTTP on an ephemeral
//! loopback port, answering with protobuf bodies built from canned globs.
//! Every call is counted, and concurrent render calls are tracked so tests can
//! assert on the peak number in flight.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use carbon_protocol::{media_types, params, paths, GlobMatch, GlobResponse};
use prost::Message;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures;

/// Field 1 announces 100 bytes that never arrive.
const TRUNCATED_PAYLOAD: &[u8] = &[0x0a, 0x64, 0x61];

/// How a stubbed call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    /// Answer 500 with a plain text body.
    ServerError,
    /// Answer 200 with a body that is not valid protobuf.
    Garbage,
}

/// One render call as the stub received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCall {
    pub target: String,
    pub from: String,
    pub until: String,
    pub format: String,
}

/// Call log and counters shared between the stub and the test.
#[derive(Debug, Default)]
pub struct StubStats {
    find_calls: AtomicUsize,
    render_calls: AtomicUsize,
    render_in_flight: AtomicUsize,
    render_peak: AtomicUsize,
    finds: Mutex<Vec<String>>,
    renders: Mutex<Vec<RenderCall>>,
}

impl StubStats {
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    pub fn render_in_flight(&self) -> usize {
        self.render_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of render calls observed in flight at once.
    pub fn peak_render_in_flight(&self) -> usize {
        self.render_peak.load(Ordering::SeqCst)
    }

    /// Patterns passed to find, in arrival order.
    pub fn finds(&self) -> Vec<String> {
        self.finds.lock().expect("stub stats poisoned").clone()
    }

    /// Render calls, in arrival order.
    pub fn renders(&self) -> Vec<RenderCall> {
        self.renders.lock().expect("stub stats poisoned").clone()
    }

    /// Rendered targets, sorted, for order-insensitive assertions.
    pub fn rendered_targets(&self) -> Vec<String> {
        let mut targets: Vec<_> = self.renders().into_iter().map(|c| c.target).collect();
        targets.sort();
        targets
    }
}

#[derive(Debug)]
struct StubConfig {
    globs: HashMap<String, Vec<GlobMatch>>,
    find_failures: HashMap<String, StubFailure>,
    render_failures: HashMap<String, StubFailure>,
    render_delay: Duration,
    render_delays: HashMap<String, Duration>,
}

#[derive(Clone)]
struct StubState {
    config: Arc<StubConfig>,
    stats: Arc<StubStats>,
}

/// Builder for [`StubZipper`].
#[derive(Debug, Default)]
pub struct StubZipperBuilder {
    globs: HashMap<String, Vec<GlobMatch>>,
    find_failures: HashMap<String, StubFailure>,
    render_failures: HashMap<String, StubFailure>,
    render_delay: Duration,
    render_delays: HashMap<String, Duration>,
}

impl StubZipperBuilder {
    /// Answer `find(pattern)` with `matches`. Unknown patterns match nothing.
    pub fn glob(mut self, pattern: &str, matches: Vec<GlobMatch>) -> Self {
        self.globs.insert(pattern.to_string(), matches);
        self
    }

    pub fn fail_find(mut self, pattern: &str, failure: StubFailure) -> Self {
        self.find_failures.insert(pattern.to_string(), failure);
        self
    }

    pub fn fail_render(mut self, path: &str, failure: StubFailure) -> Self {
        self.render_failures.insert(path.to_string(), failure);
        self
    }

    /// Hold every render call open for `delay` before answering.
    pub fn render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Override the render delay for a single path.
    pub fn render_delay_for(mut self, path: &str, delay: Duration) -> Self {
        self.render_delays.insert(path.to_string(), delay);
        self
    }

    /// Bind to an ephemeral loopback port and start serving.
    pub async fn spawn(self) -> StubZipper {
        let state = StubState {
            config: Arc::new(StubConfig {
                globs: self.globs,
                find_failures: self.find_failures,
                render_failures: self.render_failures,
                render_delay: self.render_delay,
                render_delays: self.render_delays,
            }),
            stats: Arc::new(StubStats::default()),
        };
        let stats = Arc::clone(&state.stats);

        let app = Router::new()
            .route(paths::FIND, get(find_handler))
            .route(paths::RENDER, get(render_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub zipper");
        let addr = listener.local_addr().expect("stub zipper has no address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "stub zipper stopped");
            }
        });

        StubZipper {
            addr,
            stats,
            handle,
        }
    }
}

/// A running stub zipper. Stops serving when dropped.
pub struct StubZipper {
    addr: SocketAddr,
    stats: Arc<StubStats>,
    handle: JoinHandle<()>,
}

impl StubZipper {
    pub fn builder() -> StubZipperBuilder {
        StubZipperBuilder::default()
    }

    /// Base URL to configure the zipper client with.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stats(&self) -> &StubStats {
        &self.stats
    }
}

impl Drop for StubZipper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn find_handler(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let pattern = query.get(params::QUERY).cloned().unwrap_or_default();

    state.stats.find_calls.fetch_add(1, Ordering::SeqCst);
    state
        .stats
        .finds
        .lock()
        .expect("stub stats poisoned")
        .push(pattern.clone());

    if let Some(failure) = state.config.find_failures.get(&pattern) {
        return failure_response(*failure);
    }

    let glob = GlobResponse {
        matches: state.config.globs.get(&pattern).cloned().unwrap_or_default(),
        name: pattern,
    };
    protobuf_response(glob.encode_to_vec())
}

async fn render_handler(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let field = |name: &str| query.get(name).cloned().unwrap_or_default();
    let call = RenderCall {
        target: field(params::TARGET),
        from: field(params::FROM),
        until: field(params::UNTIL),
        format: field(params::FORMAT),
    };

    let stats = &state.stats;
    stats.render_calls.fetch_add(1, Ordering::SeqCst);
    let current = stats.render_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.render_peak.fetch_max(current, Ordering::SeqCst);
    stats
        .renders
        .lock()
        .expect("stub stats poisoned")
        .push(call.clone());

    let delay = state
        .config
        .render_delays
        .get(&call.target)
        .copied()
        .unwrap_or(state.config.render_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    stats.render_in_flight.fetch_sub(1, Ordering::SeqCst);

    if let Some(failure) = state.config.render_failures.get(&call.target) {
        return failure_response(*failure);
    }

    let fetch = fixtures::fetch_response(
        &call.target,
        call.from.parse().unwrap_or(0),
        call.until.parse().unwrap_or(0),
    );
    protobuf_response(fetch.encode_to_vec())
}

fn protobuf_response(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, media_types::PROTOBUF)], body).into_response()
}

fn failure_response(failure: StubFailure) -> Response {
    match failure {
        StubFailure::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "stub failure").into_response()
        }
        StubFailure::Garbage => protobuf_response(TRUNCATED_PAYLOAD.to_vec()),
    }
}

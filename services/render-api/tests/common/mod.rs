//! In-memory zipper backend for aggregator tests.
//!
//! Counts find and render calls and tracks how many renders are running at
//! once, so tests can check the limiter bound without a network.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carbon_common::{CarbonError, CarbonResult};
use carbon_protocol::{FetchResponse, GlobMatch, GlobResponse};
use render_api::limiter::RenderLimiter;
use render_api::zipper::ZipperBackend;

pub use test_utils::fixtures;

#[derive(Debug, Default)]
pub struct MockZipper {
    globs: HashMap<String, Vec<GlobMatch>>,
    failing_finds: HashSet<String>,
    failing_renders: HashSet<String>,
    render_delay: Duration,
    render_delays: HashMap<String, Duration>,

    find_calls: AtomicUsize,
    render_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    rendered: Mutex<Vec<(String, String, String)>>,
}

impl MockZipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// `host.cpu.*` -> [a, b, c], with render of `b` failing.
    pub fn host_cpu() -> Self {
        Self::new()
            .glob(fixtures::HOST_CPU_PATTERN, fixtures::host_cpu_matches())
            .fail_render(fixtures::LEAF_B)
    }

    pub fn glob(mut self, pattern: &str, matches: Vec<GlobMatch>) -> Self {
        self.globs.insert(pattern.to_string(), matches);
        self
    }

    pub fn fail_find(mut self, pattern: &str) -> Self {
        self.failing_finds.insert(pattern.to_string());
        self
    }

    pub fn fail_render(mut self, path: &str) -> Self {
        self.failing_renders.insert(path.to_string());
        self
    }

    pub fn render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub fn render_delay_for(mut self, path: &str, delay: Duration) -> Self {
        self.render_delays.insert(path.to_string(), delay);
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Rendered paths, sorted.
    pub fn rendered_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .rendered
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// `(path, from, until)` for every render call, in arrival order.
    pub fn render_log(&self) -> Vec<(String, String, String)> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZipperBackend for MockZipper {
    async fn find(&self, pattern: &str) -> CarbonResult<GlobResponse> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_finds.contains(pattern) {
            return Err(CarbonError::Transport(format!("find {} refused", pattern)));
        }

        Ok(GlobResponse {
            name: pattern.to_string(),
            matches: self.globs.get(pattern).cloned().unwrap_or_default(),
        })
    }

    async fn render(&self, path: &str, from: &str, until: &str) -> CarbonResult<FetchResponse> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        self.rendered
            .lock()
            .unwrap()
            .push((path.to_string(), from.to_string(), until.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self
            .render_delays
            .get(path)
            .copied()
            .unwrap_or(self.render_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_renders.contains(path) {
            return Err(CarbonError::Transport(format!("render {} refused", path)));
        }

        Ok(fixtures::fetch_response(
            path,
            from.parse().unwrap_or(0),
            until.parse().unwrap_or(0),
        ))
    }
}

pub fn limiter(capacity: usize) -> Arc<RenderLimiter> {
    Arc::new(RenderLimiter::new(capacity).unwrap())
}

pub fn targets(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

//! Application metrics collection and reporting.
//!
//! Counters go to the global `metrics` recorder (exported as Prometheus text
//! by the binary) and, for request-level totals, into atomics that back the
//! JSON status endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use carbon_common::CarbonError;
use metrics::{counter, gauge, histogram};
use serde::Serialize;

/// Zipper operation labels.
pub const OP_FIND: &str = "find";
pub const OP_RENDER: &str = "render";

/// Record one zipper round-trip.
pub fn record_zipper_call(op: &'static str, elapsed: Duration, error: Option<&CarbonError>) {
    counter!("zipper_requests_total", "op" => op).increment(1);
    histogram!("zipper_request_duration_seconds", "op" => op).record(elapsed.as_secs_f64());

    if let Some(err) = error {
        counter!("zipper_errors_total", "op" => op, "kind" => err.kind()).increment(1);
    }
}

/// A limiter token was taken.
pub fn record_limiter_enter() {
    gauge!("render_limiter_in_flight").increment(1.0);
}

/// A limiter token was returned.
pub fn record_limiter_leave() {
    gauge!("render_limiter_in_flight").decrement(1.0);
}

/// Request-level totals for the render endpoint.
#[derive(Debug)]
pub struct MetricsCollector {
    render_requests: AtomicU64,
    targets_requested: AtomicU64,
    series_returned: AtomicU64,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            render_requests: AtomicU64::new(0),
            targets_requested: AtomicU64::new(0),
            series_returned: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an inbound render request carrying `targets` patterns.
    pub fn record_render_request(&self, targets: usize) {
        self.render_requests.fetch_add(1, Ordering::Relaxed);
        self.targets_requested
            .fetch_add(targets as u64, Ordering::Relaxed);
        counter!("render_requests_total").increment(1);
        counter!("render_targets_total").increment(targets as u64);
    }

    /// Record how many series one render request returned.
    pub fn record_series_returned(&self, series: usize) {
        self.series_returned
            .fetch_add(series as u64, Ordering::Relaxed);
        counter!("render_series_returned_total").increment(series as u64);
    }

    pub fn snapshot(&self) -> RequestStats {
        RequestStats {
            render_requests: self.render_requests.load(Ordering::Relaxed),
            targets_requested: self.targets_requested.load(Ordering::Relaxed),
            series_returned: self.series_returned.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    pub render_requests: u64,
    pub targets_requested: u64,
    pub series_returned: u64,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_totals() {
        let metrics = MetricsCollector::new();
        metrics.record_render_request(3);
        metrics.record_render_request(1);
        metrics.record_series_returned(2);

        let stats = metrics.snapshot();
        assert_eq!(stats.render_requests, 2);
        assert_eq!(stats.targets_requested, 4);
        assert_eq!(stats.series_returned, 2);
    }

    #[test]
    fn test_zipper_call_without_recorder_is_noop() {
        let err = CarbonError::Transport("refused".into());
        record_zipper_call(OP_RENDER, Duration::from_millis(5), Some(&err));
        record_zipper_call(OP_FIND, Duration::from_millis(1), None);
        record_limiter_enter();
        record_limiter_leave();
    }
}

//! Render fan-out / fan-in.
//!
//! Patterns are processed one at a time, in request order. Each pattern is
//! resolved with a single find call; every resulting match then gets its own
//! task, and those tasks share the process-wide [`RenderLimiter`]. A pattern's
//! results are collected in completion order before the next pattern starts.
//!
//! Failures are never reported to the caller. A failed find drops the whole
//! pattern and a failed render drops that one leaf.

use std::sync::Arc;

use carbon_common::TimeRange;
use carbon_protocol::{FetchResponse, GlobMatch};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::limiter::RenderLimiter;
use crate::zipper::ZipperBackend;

pub struct RenderAggregator {
    backend: Arc<dyn ZipperBackend>,
    limiter: Arc<RenderLimiter>,
}

impl RenderAggregator {
    pub fn new(backend: Arc<dyn ZipperBackend>, limiter: Arc<RenderLimiter>) -> Self {
        Self { backend, limiter }
    }

    pub fn limiter(&self) -> &Arc<RenderLimiter> {
        &self.limiter
    }

    /// Resolve and render every target over `range`.
    #[instrument(skip(self, targets, range), fields(targets = targets.len(), from = range.from, until = range.until))]
    pub async fn render(&self, targets: &[String], range: TimeRange) -> Vec<FetchResponse> {
        let (from, until) = range.as_params();
        let window: Arc<(String, String)> = Arc::new((from, until));

        let mut results = Vec::new();
        for pattern in targets {
            let glob = match self.backend.find(pattern).await {
                Ok(glob) => glob,
                Err(e) => {
                    debug!(pattern = %pattern, error = %e, "Dropping pattern after failed find");
                    continue;
                }
            };

            let rendered = self.render_matches(pattern, glob.matches, &window).await;
            debug!(pattern = %pattern, series = rendered.len(), "Pattern complete");
            results.extend(rendered);
        }

        results
    }

    /// Dispatch one task per match and wait for all of them.
    async fn render_matches(
        &self,
        pattern: &str,
        matches: Vec<GlobMatch>,
        window: &Arc<(String, String)>,
    ) -> Vec<FetchResponse> {
        let mut tasks = JoinSet::new();

        for glob_match in matches {
            let backend = Arc::clone(&self.backend);
            let limiter = Arc::clone(&self.limiter);
            let window = Arc::clone(window);

            tasks.spawn(async move { render_match(backend, limiter, glob_match, window).await });
        }

        let mut rendered = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(fetch)) => rendered.push(fetch),
                Ok(None) => {}
                Err(e) => warn!(pattern, error = %e, "Render task did not complete"),
            }
        }
        rendered
    }
}

/// Body of one dispatched task. `None` is the empty sentinel: a non-leaf, a
/// failed render, or a closed limiter.
async fn render_match(
    backend: Arc<dyn ZipperBackend>,
    limiter: Arc<RenderLimiter>,
    glob_match: GlobMatch,
    window: Arc<(String, String)>,
) -> Option<FetchResponse> {
    let permit = match limiter.enter().await {
        Ok(permit) => permit,
        Err(e) => {
            warn!(path = %glob_match.path, error = %e, "Render limiter closed");
            return None;
        }
    };

    let result = if glob_match.is_leaf {
        let (from, until) = window.as_ref();
        match backend.render(&glob_match.path, from, until).await {
            Ok(fetch) => Some(fetch),
            Err(e) => {
                debug!(path = %glob_match.path, kind = e.kind(), "Dropping leaf after failed render");
                None
            }
        }
    } else {
        None
    };

    permit.leave();
    result
}

//! Common test fixtures for render front end tests.
//!
//! The `host.cpu.*` fixture mirrors the canonical aggregation scenario: two
//! leaves and one namespace node under a single glob.

use carbon_protocol::{FetchResponse, GlobMatch};

/// Glob used by the canonical scenario.
pub const HOST_CPU_PATTERN: &str = "host.cpu.*";

/// Leaf whose render succeeds in the canonical scenario.
pub const LEAF_A: &str = "host.cpu.a";

/// Leaf whose render fails in the canonical scenario.
pub const LEAF_B: &str = "host.cpu.b";

/// Namespace node that must never be rendered.
pub const BRANCH_C: &str = "host.cpu.c";

/// Step between points in generated series.
pub const STEP_SECS: i32 = 60;

/// `[a (leaf), b (leaf), c (non-leaf)]`
pub fn host_cpu_matches() -> Vec<GlobMatch> {
    vec![
        GlobMatch::leaf(LEAF_A),
        GlobMatch::leaf(LEAF_B),
        GlobMatch::branch(BRANCH_C),
    ]
}

/// `count` leaves named `{prefix}.0` .. `{prefix}.{count-1}`.
pub fn leaves(prefix: &str, count: usize) -> Vec<GlobMatch> {
    (0..count)
        .map(|i| GlobMatch::leaf(format!("{}.{}", prefix, i)))
        .collect()
}

/// Deterministic series for `name` over `[from, until)`.
///
/// Values are the point index, so a test can tell series apart by length and
/// by name alone.
pub fn fetch_response(name: &str, from: i32, until: i32) -> FetchResponse {
    let points = if until > from {
        ((until - from) / STEP_SECS) as usize
    } else {
        0
    };

    FetchResponse {
        name: name.to_string(),
        start_time: from,
        stop_time: until,
        step_time: STEP_SECS,
        values: (0..points).map(|i| i as f64).collect(),
        is_absent: vec![false; points],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_cpu_matches() {
        let matches = host_cpu_matches();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches.iter().filter(|m| m.is_leaf).count(), 2);
        assert_eq!(matches[2].path, BRANCH_C);
    }

    #[test]
    fn test_leaves_naming() {
        let matches = leaves("load", 3);
        let paths: Vec<_> = matches.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["load.0", "load.1", "load.2"]);
    }

    #[test]
    fn test_fetch_response_points() {
        let fetch = fetch_response("x", 0, 300);
        assert_eq!(fetch.values.len(), 5);
        assert_eq!(fetch.is_absent.len(), 5);
        assert_eq!(fetch.step_time, STEP_SECS);

        assert!(fetch_response("x", 300, 0).values.is_empty());
    }
}

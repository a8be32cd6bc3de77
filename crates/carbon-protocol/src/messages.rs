//! Protobuf messages exchanged with the zipper.
//!
//! Field numbers follow the carbonserver proto2 schema. The JSON names are
//! the schema's own camelCase names, which is what callers of `/render/`
//! receive.

use prost::Message;
use serde::{Deserialize, Serialize};

/// One candidate path resolved from a glob pattern.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobMatch {
    #[prost(string, required, tag = "1")]
    pub path: String,

    /// Leaves hold series data; other matches are namespace nodes.
    #[prost(bool, required, tag = "2")]
    pub is_leaf: bool,
}

impl GlobMatch {
    pub fn leaf(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_leaf: true,
        }
    }

    pub fn branch(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_leaf: false,
        }
    }
}

/// Outcome of a single find call.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobResponse {
    /// The pattern as the zipper echoed it.
    #[prost(string, required, tag = "1")]
    pub name: String,

    #[prost(message, repeated, tag = "2")]
    pub matches: Vec<GlobMatch>,
}

/// Series payload for one leaf path.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    #[prost(string, required, tag = "1")]
    pub name: String,

    #[prost(int32, required, tag = "2")]
    pub start_time: i32,

    #[prost(int32, required, tag = "3")]
    pub stop_time: i32,

    #[prost(int32, required, tag = "4")]
    pub step_time: i32,

    #[prost(double, repeated, packed = "false", tag = "5")]
    pub values: Vec<f64>,

    #[prost(bool, repeated, packed = "false", tag = "6")]
    pub is_absent: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_response_json_names() {
        let fetch = FetchResponse {
            name: "host.cpu.user".to_string(),
            start_time: 100,
            stop_time: 160,
            step_time: 60,
            values: vec![1.0],
            is_absent: vec![false],
        };
        let json = serde_json::to_value(&fetch).unwrap();

        assert_eq!(json["name"], "host.cpu.user");
        assert_eq!(json["startTime"], 100);
        assert_eq!(json["stopTime"], 160);
        assert_eq!(json["stepTime"], 60);
        assert_eq!(json["values"], serde_json::json!([1.0]));
        assert_eq!(json["isAbsent"], serde_json::json!([false]));
    }

    #[test]
    fn test_glob_match_constructors() {
        assert!(GlobMatch::leaf("a.b").is_leaf);
        assert!(!GlobMatch::branch("a").is_leaf);
    }

    #[test]
    fn test_unpacked_and_packed_values_both_decode() {
        // values = [2.0] written packed (length-delimited) instead of unpacked.
        let mut body = vec![0x0a, 0x01, b'x'];
        body.extend_from_slice(&[0x2a, 0x08]);
        body.extend_from_slice(&2.0f64.to_le_bytes());

        let fetch = FetchResponse::decode(body.as_slice()).unwrap();
        assert_eq!(fetch.name, "x");
        assert_eq!(fetch.values, vec![2.0]);
    }
}

//! Zipper protocol
//!
//! Types and helpers for talking to a carbonserver-style zipper node over its
//! find/render HTTP interface. Payloads travel as protobuf (proto2) and the
//! render results are handed back to callers as JSON unchanged.
//!
//! # Example
//!
//! ```rust
//! use carbon_protocol::{decode_glob, GlobMatch, GlobResponse};
//! use prost::Message;
//!
//! let glob = GlobResponse {
//!     name: "host.cpu.*".to_string(),
//!     matches: vec![GlobMatch::leaf("host.cpu.user")],
//! };
//! let decoded = decode_glob(&glob.encode_to_vec()).unwrap();
//! assert!(decoded.matches[0].is_leaf);
//! ```

pub mod messages;

pub use messages::{FetchResponse, GlobMatch, GlobResponse};

use carbon_common::CarbonError;
use prost::Message;

/// Paths served by a zipper node.
pub mod paths {
    /// Glob resolution endpoint.
    pub const FIND: &str = "/metrics/find/";
    /// Series fetch endpoint.
    pub const RENDER: &str = "/render/";
}

/// Query parameter names and values used on zipper calls.
pub mod params {
    pub const QUERY: &str = "query";
    pub const TARGET: &str = "target";
    pub const FORMAT: &str = "format";
    pub const FROM: &str = "from";
    pub const UNTIL: &str = "until";
    /// The only payload format this front end requests.
    pub const PROTOBUF: &str = "protobuf";
}

/// Media types seen on the wire.
pub mod media_types {
    pub const PROTOBUF: &str = "application/x-protobuf";
    pub const JSON: &str = "application/json";
}

/// Decode a find response body.
pub fn decode_glob(body: &[u8]) -> Result<GlobResponse, CarbonError> {
    GlobResponse::decode(body).map_err(|e| CarbonError::Decode(format!("GlobResponse: {}", e)))
}

/// Decode a render response body.
pub fn decode_fetch(body: &[u8]) -> Result<FetchResponse, CarbonError> {
    FetchResponse::decode(body).map_err(|e| CarbonError::Decode(format!("FetchResponse: {}", e)))
}

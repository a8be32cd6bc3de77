//! Shared test utilities for the render front end workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A stub zipper node speaking the find/render protobuf protocol
//! - Call counters and concurrency high-water marks for that stub
//! - Canned glob and series fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then start a stub in a tokio test:
//!
//! ```ignore
//! use test_utils::{fixtures, StubZipper};
//!
//! let stub = StubZipper::builder()
//!     .glob(fixtures::HOST_CPU_PATTERN, fixtures::host_cpu_matches())
//!     .spawn()
//!     .await;
//! let base_url = stub.base_url();
//! ```

pub mod fixtures;
pub mod stub;

pub use stub::{RenderCall, StubFailure, StubStats, StubZipper, StubZipperBuilder};

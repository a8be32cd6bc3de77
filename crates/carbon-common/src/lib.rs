//! Common types and utilities shared across the render front end crates.

pub mod error;
pub mod time;

pub use error::{CarbonError, CarbonResult};
pub use time::{normalize_date, TimeRange, DEFAULT_LOOKBACK_SECS};

//! Error types for the render front end.

use thiserror::Error;

/// Result type alias using CarbonError.
pub type CarbonResult<T> = Result<T, CarbonError>;

/// Primary error type for zipper calls and startup configuration.
#[derive(Debug, Error)]
pub enum CarbonError {
    // === Backend Errors ===
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    // === Startup Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CarbonError {
    /// Short label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CarbonError::Transport(_) => "transport",
            CarbonError::Status { .. } => "status",
            CarbonError::Decode(_) => "decode",
            CarbonError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(CarbonError::Transport("refused".into()).kind(), "transport");
        assert_eq!(CarbonError::Decode("truncated".into()).kind(), "decode");
        assert_eq!(CarbonError::Config("no zipper".into()).kind(), "config");
        assert_eq!(
            CarbonError::Status {
                url: "http://zipper/render/".into(),
                status: 502
            }
            .kind(),
            "status"
        );
    }

    #[test]
    fn test_error_display() {
        let err = CarbonError::Status {
            url: "http://zipper/render/".into(),
            status: 503,
        };
        let display = format!("{}", err);
        assert!(display.contains("503"));
        assert!(display.contains("http://zipper/render/"));
    }
}

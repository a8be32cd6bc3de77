//! Startup configuration.
//!
//! Command line flags (with environment fallbacks) are parsed into [`Args`]
//! and validated once into a [`RenderApiConfig`] of plain values. Nothing here
//! is consulted again after startup.

use std::net::SocketAddr;
use std::time::Duration;

use carbon_common::{CarbonError, CarbonResult};
use clap::Parser;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Render API server
#[derive(Parser, Debug, Clone)]
#[command(name = "render-api")]
#[command(about = "Resolves metric globs against a zipper and aggregates the rendered series")]
pub struct Args {
    /// Zipper base URL (required)
    #[arg(short = 'z', long, env = "ZIPPER_URL")]
    pub zipper: Option<String>,

    /// Listen port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT, env = "RENDER_API_PORT")]
    pub port: u16,

    /// Listen host
    #[arg(long, default_value = "0.0.0.0", env = "RENDER_API_HOST")]
    pub listen_host: String,

    /// Maximum concurrent render calls to the zipper, shared by all requests
    #[arg(short = 'l', long, default_value_t = DEFAULT_CONCURRENCY_LIMIT, env = "RENDER_CONCURRENCY_LIMIT")]
    pub limit: usize,

    /// Timeout for a single zipper call, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "ZIPPER_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "RENDER_WORKER_THREADS")]
    pub worker_threads: Option<usize>,
}

/// Validated configuration consumed by the service.
#[derive(Debug, Clone)]
pub struct RenderApiConfig {
    /// Zipper base URL without a trailing slash.
    pub zipper_url: String,
    pub listen_addr: SocketAddr,
    pub concurrency_limit: usize,
    pub request_timeout: Duration,
}

impl RenderApiConfig {
    pub fn from_args(args: &Args) -> CarbonResult<Self> {
        let zipper_url = parse_zipper_url(args.zipper.as_deref().unwrap_or_default())?;

        let listen_addr: SocketAddr = format!("{}:{}", args.listen_host, args.port)
            .parse()
            .map_err(|e| {
                CarbonError::Config(format!(
                    "invalid listen address {}:{}: {}",
                    args.listen_host, args.port, e
                ))
            })?;

        if args.limit == 0 {
            return Err(CarbonError::Config(
                "concurrency limit (-l) must be at least 1".to_string(),
            ));
        }

        if args.timeout_secs == 0 {
            return Err(CarbonError::Config(
                "zipper timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            zipper_url,
            listen_addr,
            concurrency_limit: args.limit,
            request_timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}

/// Check the zipper address and strip any trailing slash.
pub fn parse_zipper_url(raw: &str) -> CarbonResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CarbonError::Config("no zipper (-z) provided".to_string()));
    }

    let url = reqwest::Url::parse(raw)
        .map_err(|e| CarbonError::Config(format!("unable to parse zipper {}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CarbonError::Config(format!(
                "unsupported zipper scheme '{}' in {}",
                other, raw
            )))
        }
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["render-api"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RenderApiConfig::from_args(&args(&["-z", "http://zipper:8080"])).unwrap();

        assert_eq!(config.zipper_url, "http://zipper:8080");
        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert_eq!(config.concurrency_limit, DEFAULT_CONCURRENCY_LIMIT);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_short_flags() {
        let config = RenderApiConfig::from_args(&args(&[
            "-z",
            "http://zipper/",
            "-p",
            "9090",
            "-l",
            "5",
        ]))
        .unwrap();

        assert_eq!(config.zipper_url, "http://zipper");
        assert_eq!(config.listen_addr.port(), 9090);
        assert_eq!(config.concurrency_limit, 5);
    }

    #[test]
    fn test_missing_zipper_is_config_error() {
        let err = RenderApiConfig::from_args(&Args {
            zipper: None,
            ..args(&["-z", "http://placeholder"])
        })
        .unwrap_err();

        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("no zipper"));
    }

    #[test]
    fn test_unparsable_zipper_is_config_error() {
        assert!(matches!(
            parse_zipper_url("not a url"),
            Err(CarbonError::Config(_))
        ));
        assert!(matches!(
            parse_zipper_url("ftp://zipper"),
            Err(CarbonError::Config(_))
        ));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = RenderApiConfig::from_args(&args(&["-z", "http://zipper", "-l", "0"])).unwrap_err();
        assert!(err.to_string().contains("concurrency limit"));
    }

    #[test]
    fn test_bad_listen_host_rejected() {
        let err = RenderApiConfig::from_args(&args(&[
            "-z",
            "http://zipper",
            "--listen-host",
            "not-an-ip",
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}

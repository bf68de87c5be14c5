//! Polite-Crawler: a bounded-concurrency, polite web crawler
//!
//! This crate implements a web crawler that runs a fixed pool of workers over a
//! shared frontier, respecting robots.txt, per-host request spacing, and a
//! cooperative cancellation model with a bounded shutdown grace period.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Top-level error type for a crawl run
///
/// Per-task failures never surface here; they are recorded as outcomes. Only
/// failures that prevent a run from starting or from persisting its results do.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors attached to a single crawl task
///
/// These are cloneable so they can travel inside a `FetchOutcome` to both the
/// statistics aggregator and the result sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    FetchTimeout { url: String, timeout_ms: u64 },

    #[error("Request to {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("robots.txt fetch for {host} failed: {message}")]
    RobotsFetch { host: String, message: String },

    #[error("Cancelled while processing {url}")]
    Cancelled { url: String },
}

impl TaskError {
    /// Returns true if the failure is worth another attempt
    ///
    /// Timeouts, transport errors, server errors and HTTP 429 are transient;
    /// every other status is a final answer from the server.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::FetchTimeout { .. } | Self::Fetch { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, CrawlState, ShutdownHandle, StopReason};
pub use output::{CrawlStats, StatsAggregator};
pub use state::{CrawlTask, FetchOutcome, PageState};
pub use url::{canonicalize, VisitedSet};

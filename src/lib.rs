//! Listing-Harvester: a polite marketplace listing harvester
//!
//! This crate discovers vendor/app listings on two external marketplaces
//! (Salesforce AppExchange via its sitemap, HubSpot Marketplace via paginated
//! listing pages), normalizes them into a single record schema, and forwards the
//! records to a durable local JSON file and an optional webhook sink.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;

use thiserror::Error;

pub use record::Marketplace;

/// Main error type for Listing-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Discriminant of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    HttpStatus,
    Transport,
    ContentMismatch,
}

/// Errors from a single outbound GET request
///
/// The fetcher never retries; callers decide whether a failure is fatal
/// (root discovery) or skip-worthy (one listing detail).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {code} for {url}")]
    HttpStatus { url: String, code: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Unexpected content type '{content_type}' for {url}")]
    ContentMismatch { url: String, content_type: String },
}

impl FetchError {
    /// Returns the kind of failure
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::HttpStatus { .. } => FetchErrorKind::HttpStatus,
            Self::Transport { .. } => FetchErrorKind::Transport,
            Self::ContentMismatch { .. } => FetchErrorKind::ContentMismatch,
        }
    }

    /// Returns the URL that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::HttpStatus { url, .. }
            | Self::Transport { url, .. }
            | Self::ContentMismatch { url, .. } => url,
        }
    }
}

/// Failure to turn one listing reference into a raw listing
#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Could not extract listing from {url}: {message}")]
    Extract { url: String, message: String },
}

/// Errors raised while mapping a raw listing into a canonical record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("Missing required field '{field}' for {url}")]
    MissingRequiredField { field: &'static str, url: String },
}

/// Run-fatal errors for a single marketplace run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Discovery failed for {marketplace}: {reason}")]
    DiscoveryFailed {
        marketplace: Marketplace,
        reason: String,
    },
}

/// Local sink errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for Listing-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_marketplace, RunReport};
pub use output::RunStats;
pub use record::{CanonicalRecord, RecordNormalizer};
pub use state::CrawlPhase;

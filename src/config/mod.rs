//! Configuration module for Listing-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering environment/command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Webhook enabled: {}", config.webhook.url.is_some());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HubspotConfig, OutputConfig, SalesforceConfig, UserAgentConfig,
    WebhookConfig,
};

// Re-export parser functions
pub use parser::{apply_overrides, load_config, resolve_config, ConfigOverrides};
pub use validation::validate;

//! Commenter-Census: device brand census of a profile's commenters
//!
//! This crate walks a social-media author's posts, pages through the comments
//! on each post, resolves every distinct commenter's device brand from their own
//! latest posts, and accumulates a deduplicated brand histogram.

pub mod brand;
pub mod config;
pub mod crawler;
pub mod enrich;
pub mod output;
pub mod stats;

use thiserror::Error;

/// Main error type for Commenter-Census operations
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

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

/// Result type alias for Commenter-Census operations
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use brand::{BrandTable, Classifier};
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, StopReason};
pub use stats::{StatsSnapshot, Tally};

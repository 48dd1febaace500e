//! Sumi-Press: a site-to-archive exporter
//!
//! This crate crawls a website from a seed URL, renders every visited page
//! through a headless browser (as a paginated PDF or as a set of tiled PNG
//! captures) and streams the results into a single ZIP archive.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod export;
pub mod jobs;
pub mod output;
pub mod render;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Press operations
#[derive(Debug, Error)]
pub enum PressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job not found: {0}")]
    NotFound(jobs::JobId),

    #[error("Result of job {0} is already being streamed")]
    AlreadyStreaming(jobs::JobId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Could not resolve link {href}: {reason}")]
    LinkResolution { href: String, reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobState,
        to: state::JobState,
    },

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
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Press operations
pub type Result<T> = std::result::Result<T, PressError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use export::{ExportArtifact, ExportMode};
pub use jobs::{JobId, JobService, StartJobParams};
pub use state::JobState;
pub use url::{derive_page_name, normalize_url, Origin, ScopeMode};

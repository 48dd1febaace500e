//! Configuration module for Sumi-Press
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file) yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_press::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("press.toml")).unwrap();
//! println!("Export mode: {}", config.export.mode);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ExportConfig, LimitsConfig, RendererConfig, ScratchConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::{validate, DEPTH_RANGE, MAX_PAGES_LIMIT};

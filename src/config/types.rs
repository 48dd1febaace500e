use crate::export::ExportMode;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Sumi-Press
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub scratch: ScratchConfig,
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Explicit Chrome/Chromium executable
    #[serde(rename = "chrome-path")]
    pub chrome_path: Option<PathBuf>,

    /// Run the browser without a window
    pub headless: bool,

    /// Upper bound on one page navigation (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Largest viewport height the engine can lay out in one piece (pixels)
    #[serde(rename = "engine-max-height")]
    pub engine_max_height: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            navigation_timeout_ms: 15_000,
            engine_max_height: 16_384,
        }
    }
}

/// Page export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Document (PDF) or tiled PNG captures
    pub mode: ExportMode,

    /// Default target viewport width when a job does not give one
    #[serde(rename = "viewport-width")]
    pub viewport_width: u32,

    #[serde(rename = "min-viewport-width")]
    pub min_viewport_width: u32,

    #[serde(rename = "max-viewport-width")]
    pub max_viewport_width: u32,

    /// Reference DPI for the print-page-equivalent tile height
    pub dpi: u32,

    /// DEFLATE level for archive entries (0-9)
    #[serde(rename = "compression-level")]
    pub compression_level: i64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::Document,
            viewport_width: 1280,
            min_viewport_width: 640,
            max_viewport_width: 3840,
            dpi: 96,
            compression_level: 6,
        }
    }
}

/// Job parameter defaults and caps
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    #[serde(rename = "default-depth")]
    pub default_depth: u32,

    #[serde(rename = "default-max-pages")]
    pub default_max_pages: u32,

    /// Largest max-pages value a job may request
    #[serde(rename = "max-pages-cap")]
    pub max_pages_cap: u32,

    /// Pause after every attempted page (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Probe each URL with HEAD and skip non-HTML content before rendering
    pub preflight: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_depth: 2,
            default_max_pages: 500,
            max_pages_cap: 500_000,
            page_delay_ms: 0,
            preflight: false,
        }
    }
}

/// Scratch storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Parent of the per-job `job-<id>` directories
    pub dir: PathBuf,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("sumi-press"),
        }
    }
}

//! Rendering engine boundary
//!
//! The exporter talks to the headless browser only through these traits:
//! - `EngineLauncher` creates one engine per job (its own browser profile)
//! - `RenderEngine` drives a single page/tab: navigate, read the DOM,
//!   print to PDF, resize the viewport and capture regions
//!
//! The production implementation lives in [`chromium`]; tests provide fakes.

pub mod chromium;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

pub use chromium::{ChromiumEngine, ChromiumLauncher};

/// Errors raised by a rendering engine
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Unsupported content at {url}: {content_type}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("Failed to launch rendering engine: {0}")]
    Launch(String),

    #[error("Rendering engine error: {0}")]
    Engine(String),
}

/// Full scrollable size of the rendered document, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScrollSize {
    pub width: u32,
    pub height: u32,
}

/// Viewport geometry for a tiled capture
///
/// The layout width stays at the document's CSS width; `scale` is the device
/// scale factor, so captured images are `css_width * scale` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSpec {
    pub css_width: u32,
    pub css_height: u32,
    pub scale: f64,
}

/// Paper geometry for document mode, in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperFormat {
    pub width_in: f64,
    pub height_in: f64,
    pub print_background: bool,
}

impl PaperFormat {
    /// ISO A4 with backgrounds
    pub const A4: PaperFormat = PaperFormat {
        width_in: 8.27,
        height_in: 11.69,
        print_background: true,
    };
}

/// One page/tab of a rendering engine, exclusively owned by one job
#[async_trait]
pub trait RenderEngine: Send {
    /// Navigates to `url` and waits for the load to settle
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError>;

    /// Serialized DOM of the current page
    async fn html(&mut self) -> Result<String, RenderError>;

    /// Renders the current page into a paginated PDF
    async fn print_pdf(&mut self, paper: &PaperFormat) -> Result<Vec<u8>, RenderError>;

    /// Full scrollable width and height of the current document
    async fn scroll_size(&mut self) -> Result<ScrollSize, RenderError>;

    /// Resizes the rendering viewport
    async fn set_viewport(&mut self, viewport: &ViewportSpec) -> Result<(), RenderError>;

    /// Captures a PNG of `height` device pixels starting at device pixel `y`
    async fn capture(&mut self, y: u32, height: u32) -> Result<Vec<u8>, RenderError>;

    /// Closes the page and the browser behind it
    async fn shutdown(&mut self) -> Result<(), RenderError>;
}

/// Creates rendering engines, one per job
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Launches an engine whose scratch state lives under `profile_dir`
    async fn launch(&self, profile_dir: &Path) -> Result<Box<dyn RenderEngine>, RenderError>;
}

//! Page exporter
//!
//! Turns one URL into archive artifacts through a [`RenderEngine`]:
//! - `document` mode prints a single A4 PDF named `<page>.pdf`
//! - `tiles` mode captures the full page as `<page>_part<N>.png` segments,
//!   `N` zero-based and top to bottom
//!
//! Navigation is bounded by the configured timeout. The page's HTML can be
//! captured in the same visit so the crawler does not fetch it twice.

mod tiling;

pub use tiling::{reference_page_height_px, Tile, TilePlan, TilingParams, A4_HEIGHT_IN};

use crate::render::{PaperFormat, RenderEngine, RenderError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// How a page is turned into artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// One paginated PDF per page
    #[default]
    Document,
    /// Full-page PNG captures cut into print-page-sized tiles
    Tiles,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Tiles => "tiles",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "pdf" => Ok(Self::Document),
            "tiles" | "png" => Ok(Self::Tiles),
            other => Err(format!(
                "unknown export mode '{}', expected 'document' or 'tiles'",
                other
            )),
        }
    }
}

/// One named payload destined for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Result of exporting one page
#[derive(Debug, Clone, Default)]
pub struct PageExport {
    /// Artifacts in archive order
    pub artifacts: Vec<ExportArtifact>,
    /// Rendered HTML, when requested
    pub html: Option<String>,
}

/// Per-job export parameters
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub mode: ExportMode,
    pub tiling: TilingParams,
    pub navigation_timeout: Duration,
    pub paper: PaperFormat,
}

/// Drives a rendering engine to export pages
#[derive(Debug, Clone)]
pub struct PageExporter {
    settings: ExportSettings,
}

impl PageExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Exports `url` under the artifact base name `name`
    ///
    /// # Arguments
    ///
    /// * `engine` - The job's rendering engine
    /// * `url` - Page to export
    /// * `name` - Unique artifact base name for this page
    /// * `capture_html` - Also return the rendered HTML for link discovery
    ///
    /// # Returns
    ///
    /// * `Ok(PageExport)` - All artifacts of the page, in order
    /// * `Err(RenderError)` - Navigation timed out or the engine failed; no
    ///   artifact of this page should be archived
    pub async fn export(
        &self,
        engine: &mut dyn RenderEngine,
        url: &Url,
        name: &str,
        capture_html: bool,
    ) -> Result<PageExport, RenderError> {
        self.navigate(engine, url).await?;

        let html = if capture_html {
            Some(engine.html().await?)
        } else {
            None
        };

        let artifacts = match self.settings.mode {
            ExportMode::Document => {
                let bytes = engine.print_pdf(&self.settings.paper).await?;
                vec![ExportArtifact::new(format!("{}.pdf", name), bytes)]
            }
            ExportMode::Tiles => self.capture_tiles(engine, name).await?,
        };

        Ok(PageExport { artifacts, html })
    }

    async fn navigate(&self, engine: &mut dyn RenderEngine, url: &Url) -> Result<(), RenderError> {
        let timeout = self.settings.navigation_timeout;
        match tokio::time::timeout(timeout, engine.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn capture_tiles(
        &self,
        engine: &mut dyn RenderEngine,
        name: &str,
    ) -> Result<Vec<ExportArtifact>, RenderError> {
        let scroll = engine.scroll_size().await?;
        let plan = TilePlan::compute(scroll, &self.settings.tiling);

        tracing::debug!(
            scroll_width = scroll.width,
            scroll_height = scroll.height,
            scale = plan.scale,
            viewport_height = plan.viewport_height,
            tile_height = plan.tile_height,
            tiles = plan.tiles().len(),
            "Planned tiled capture"
        );

        engine.set_viewport(&plan.viewport()).await?;

        let mut artifacts = Vec::with_capacity(plan.tiles().len());
        for tile in plan.tiles() {
            let bytes = engine.capture(tile.y, tile.height).await?;
            artifacts.push(ExportArtifact::new(
                format!("{}_part{}.png", name, tile.index),
                bytes,
            ));
        }

        Ok(artifacts)
    }
}

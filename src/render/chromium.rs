//! Headless Chrome engine backed by chromiumoxide
//!
//! Each job gets its own browser process with a user-data directory under the
//! job's scratch directory, and a single page that is reused for every URL.

use super::{EngineLauncher, PaperFormat, RenderEngine, RenderError, ScrollSize, ViewportSpec};
use crate::config::RendererConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::{
    ClearDeviceMetricsOverrideParams, SetDeviceMetricsOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, PrintToPdfParams, Viewport,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Reads the full scrollable size of the document
const SCROLL_SIZE_SCRIPT: &str = r#"
    (() => {
        const root = document.documentElement;
        const body = document.body;
        return {
            width: Math.max(root ? root.scrollWidth : 0, body ? body.scrollWidth : 0, 1),
            height: Math.max(root ? root.scrollHeight : 0, body ? body.scrollHeight : 0, 1)
        };
    })()
"#;

/// Initial window size before any per-page viewport override
const DEFAULT_WINDOW: (u32, u32) = (1280, 800);

/// Launches one Chrome instance per job
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: RendererConfig,
}

impl ChromiumLauncher {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineLauncher for ChromiumLauncher {
    async fn launch(&self, profile_dir: &Path) -> Result<Box<dyn RenderEngine>, RenderError> {
        // Discovery may shell out to `which`
        let configured = self.config.chrome_path.clone();
        let executable =
            tokio::task::spawn_blocking(move || find_browser_executable(configured.as_deref()))
                .await
                .map_err(|e| RenderError::Launch(format!("browser discovery failed: {}", e)))??;

        tokio::fs::create_dir_all(profile_dir).await.map_err(|e| {
            RenderError::Launch(format!(
                "cannot create profile directory {}: {}",
                profile_dir.display(),
                e
            ))
        })?;

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_millis(self.config.navigation_timeout_ms))
            .window_size(DEFAULT_WINDOW.0, DEFAULT_WINDOW.1)
            .user_data_dir(profile_dir)
            .chrome_executable(executable)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        builder = if self.config.headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        let browser_config = builder.build().map_err(RenderError::Launch)?;

        tracing::debug!(profile = %profile_dir.display(), "Launching browser");
        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // chromiumoxide reports CDP events it cannot decode; they are not fatal
                    tracing::trace!("Browser handler error: {}", e);
                }
            }
            tracing::debug!("Browser handler task completed");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(RenderError::Launch(format!("cannot open page: {}", e)));
            }
        };

        Ok(Box::new(ChromiumEngine {
            browser,
            page,
            handler_task,
            viewport: None,
        }))
    }
}

/// A single Chrome page driven over CDP
pub struct ChromiumEngine {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    viewport: Option<ViewportSpec>,
}

fn engine_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Engine(e.to_string())
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        // A previous tiled capture leaves its override behind
        if self.viewport.take().is_some() {
            self.page
                .execute(ClearDeviceMetricsOverrideParams::default())
                .await
                .map_err(engine_error)?;
        }

        // `goto` resolves once the page has loaded
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        self.page.content().await.map_err(engine_error)
    }

    async fn print_pdf(&mut self, paper: &PaperFormat) -> Result<Vec<u8>, RenderError> {
        let params = PrintToPdfParams {
            print_background: Some(paper.print_background),
            paper_width: Some(paper.width_in),
            paper_height: Some(paper.height_in),
            ..Default::default()
        };

        self.page.pdf(params).await.map_err(engine_error)
    }

    async fn scroll_size(&mut self) -> Result<ScrollSize, RenderError> {
        let result = self
            .page
            .evaluate(SCROLL_SIZE_SCRIPT)
            .await
            .map_err(engine_error)?;

        result.into_value::<ScrollSize>().map_err(engine_error)
    }

    async fn set_viewport(&mut self, viewport: &ViewportSpec) -> Result<(), RenderError> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.css_width),
            i64::from(viewport.css_height),
            viewport.scale,
            false,
        );

        self.page.execute(params).await.map_err(engine_error)?;
        self.viewport = Some(*viewport);
        Ok(())
    }

    async fn capture(&mut self, y: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let viewport = self
            .viewport
            .ok_or_else(|| RenderError::Engine("capture requested before set_viewport".into()))?;

        // The clip is in CSS pixels; the device scale factor does the scaling
        let clip = Viewport {
            x: 0.0,
            y: f64::from(y) / viewport.scale,
            width: f64::from(viewport.css_width),
            height: f64::from(height) / viewport.scale,
            scale: 1.0,
        };

        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            clip: Some(clip),
            capture_beyond_viewport: Some(true),
            ..Default::default()
        };

        self.page.screenshot(params).await.map_err(engine_error)
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        let _ = self.page.clone().close().await;
        let closed = self.browser.close().await.map(|_| ()).map_err(engine_error);
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        closed
    }
}

/// Finds a Chrome/Chromium executable
///
/// Search order: configured path, `CHROMIUM_PATH`, common install locations,
/// then `which` on Unix systems.
pub fn find_browser_executable(configured: Option<&Path>) -> Result<PathBuf, RenderError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured chrome-path does not exist: {}",
            path.display()
        );
    }

    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        tracing::warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(found) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found browser at: {}", found.display());
        return Ok(found);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if output.status.success() && !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(RenderError::Launch(
        "Chrome/Chromium executable not found; set renderer.chrome-path or CHROMIUM_PATH"
            .to_string(),
    ))
}

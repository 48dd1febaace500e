use crate::config::{Config, DEPTH_RANGE};
use crate::export::ExportMode;
use crate::url::{ScopeMode, Seed};
use crate::PressError;
use std::time::Duration;

/// Parameters of a job-start request, as received from a front end
///
/// Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct StartJobParams {
    pub url: String,
    pub depth: Option<u32>,
    pub scope: Option<ScopeMode>,
    pub page_delay_ms: Option<u64>,
    pub max_pages: Option<u32>,
    /// Target output width in pixels
    pub resolution: Option<u32>,
    pub mode: Option<ExportMode>,
}

impl StartJobParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn scope(mut self, scope: ScopeMode) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn page_delay_ms(mut self, delay: u64) -> Self {
        self.page_delay_ms = Some(delay);
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn resolution(mut self, width: u32) -> Self {
        self.resolution = Some(width);
        self
    }

    pub fn mode(mut self, mode: ExportMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// A validated job request
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub seed: Seed,
    /// Link hops allowed beyond the seed (1-3)
    pub max_depth: u32,
    /// Pages attempted before the job stops
    pub max_pages: u32,
    pub scope: ScopeMode,
    pub page_delay: Duration,
    pub mode: ExportMode,
    /// Output width after clamping to the configured bounds
    pub viewport_width: u32,
}

impl JobRequest {
    /// Validates start parameters against the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(JobRequest)` - All parameters in range; unset ones defaulted
    /// * `Err(PressError::InvalidInput)` - Malformed seed or out-of-range value
    pub fn from_params(params: &StartJobParams, config: &Config) -> Result<Self, PressError> {
        let url = params.url.trim();
        if url.is_empty() {
            return Err(PressError::InvalidInput("seed URL is required".to_string()));
        }

        let seed = Seed::parse(url)
            .map_err(|e| PressError::InvalidInput(format!("invalid seed URL '{}': {}", url, e)))?;

        let max_depth = params.depth.unwrap_or(config.limits.default_depth);
        if !DEPTH_RANGE.contains(&max_depth) {
            return Err(PressError::InvalidInput(format!(
                "depth must be between {} and {}, got {}",
                DEPTH_RANGE.start(),
                DEPTH_RANGE.end(),
                max_depth
            )));
        }

        let cap = config.limits.max_pages_cap;
        let max_pages = params.max_pages.unwrap_or(config.limits.default_max_pages);
        if max_pages < 1 || max_pages > cap {
            return Err(PressError::InvalidInput(format!(
                "max pages must be between 1 and {}, got {}",
                cap, max_pages
            )));
        }

        let viewport_width = match params.resolution {
            Some(0) => {
                return Err(PressError::InvalidInput(
                    "resolution must be greater than 0".to_string(),
                ))
            }
            Some(width) => width.clamp(
                config.export.min_viewport_width,
                config.export.max_viewport_width,
            ),
            None => config.export.viewport_width,
        };

        Ok(Self {
            seed,
            max_depth,
            max_pages,
            scope: params.scope.unwrap_or(ScopeMode::Children),
            page_delay: Duration::from_millis(
                params.page_delay_ms.unwrap_or(config.limits.page_delay_ms),
            ),
            mode: params.mode.unwrap_or(config.export.mode),
            viewport_width,
        })
    }
}

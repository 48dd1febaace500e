use crate::config::types::{Config, ExportConfig, LimitsConfig, RendererConfig, ScratchConfig};
use crate::ConfigError;

/// Hard ceiling on the number of pages a single job may export
pub const MAX_PAGES_LIMIT: u32 = 500_000;

/// Inclusive bounds on a job's traversal depth
pub const DEPTH_RANGE: std::ops::RangeInclusive<u32> = 1..=3;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_renderer_config(&config.renderer)?;
    validate_export_config(&config.export)?;
    validate_limits_config(&config.limits)?;
    validate_scratch_config(&config.scratch)?;
    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.engine_max_height < 1 {
        return Err(ConfigError::Validation(format!(
            "engine-max-height must be >= 1, got {}",
            config.engine_max_height
        )));
    }

    Ok(())
}

/// Validates export configuration
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.min_viewport_width == 0 {
        return Err(ConfigError::Validation(
            "min-viewport-width must be > 0".to_string(),
        ));
    }

    if config.min_viewport_width > config.max_viewport_width {
        return Err(ConfigError::Validation(format!(
            "min-viewport-width ({}) must not exceed max-viewport-width ({})",
            config.min_viewport_width, config.max_viewport_width
        )));
    }

    if !(config.min_viewport_width..=config.max_viewport_width).contains(&config.viewport_width) {
        return Err(ConfigError::Validation(format!(
            "viewport-width must be between {} and {}, got {}",
            config.min_viewport_width, config.max_viewport_width, config.viewport_width
        )));
    }

    if !(24..=600).contains(&config.dpi) {
        return Err(ConfigError::Validation(format!(
            "dpi must be between 24 and 600, got {}",
            config.dpi
        )));
    }

    if !(0..=9).contains(&config.compression_level) {
        return Err(ConfigError::Validation(format!(
            "compression-level must be between 0 and 9, got {}",
            config.compression_level
        )));
    }

    Ok(())
}

/// Validates job limits
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if !DEPTH_RANGE.contains(&config.default_depth) {
        return Err(ConfigError::Validation(format!(
            "default-depth must be between {} and {}, got {}",
            DEPTH_RANGE.start(),
            DEPTH_RANGE.end(),
            config.default_depth
        )));
    }

    if config.max_pages_cap < 1 || config.max_pages_cap > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-pages-cap must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages_cap
        )));
    }

    if config.default_max_pages < 1 || config.default_max_pages > config.max_pages_cap {
        return Err(ConfigError::Validation(format!(
            "default-max-pages must be between 1 and {}, got {}",
            config.max_pages_cap, config.default_max_pages
        )));
    }

    Ok(())
}

fn validate_scratch_config(config: &ScratchConfig) -> Result<(), ConfigError> {
    if config.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "scratch dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

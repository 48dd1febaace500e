//! Tile planning for full-page captures
//!
//! A rendered page may be far taller than the engine can capture in one call.
//! The plan scales the page to the target width, caps the laid-out height at
//! the engine maximum, and cuts it into print-page-sized tiles from the top.

use crate::render::{ScrollSize, ViewportSpec};

/// Height of one A4 page in inches
pub const A4_HEIGHT_IN: f64 = 11.69;

/// Inputs of the tiling computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingParams {
    /// Requested output width in device pixels
    pub target_width: u32,
    pub min_width: u32,
    pub max_width: u32,
    /// Reference DPI for the print-page-equivalent tile height
    pub dpi: u32,
    /// Largest height the engine can lay out and capture at once
    pub engine_max_height: u32,
}

/// One capture region, in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Zero-based position, top to bottom
    pub index: usize,
    pub y: u32,
    pub height: u32,
}

/// The full capture plan for one page
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    /// Effective output width after clamping
    pub viewport_width: u32,
    /// Device pixels per CSS pixel
    pub scale: f64,
    /// Total captured height (V)
    pub viewport_height: u32,
    /// Nominal tile height (T)
    pub tile_height: u32,
    /// Document width in CSS pixels
    pub css_width: u32,
    tiles: Vec<Tile>,
}

/// Pixel height of one print page at `dpi`
///
/// # Examples
///
/// ```
/// use sumi_press::export::reference_page_height_px;
///
/// assert_eq!(reference_page_height_px(96), 1123);
/// ```
pub fn reference_page_height_px(dpi: u32) -> u32 {
    (A4_HEIGHT_IN * f64::from(dpi)).ceil() as u32
}

impl TilePlan {
    /// Plans the tiles for a document of the given scroll size
    ///
    /// - `viewport_width = clamp(target_width, min_width, max_width)`
    /// - `scale = viewport_width / scroll_width`
    /// - `V = min(ceil(scroll_height * scale), engine_max_height)`
    /// - `T = ceil(reference_page_height_px(dpi) * scale)`, capped at the
    ///   engine maximum
    ///
    /// Tiles start at `y = 0`, each `min(T, V - y)` tall, advancing by `T`
    /// until `y >= V`. There are `ceil(V / T)` of them and their heights sum
    /// to `V`.
    pub fn compute(scroll: ScrollSize, params: &TilingParams) -> Self {
        let engine_max = params.engine_max_height.max(1);
        let min_width = params.min_width.max(1);
        let max_width = params.max_width.max(min_width);
        let viewport_width = params.target_width.clamp(min_width, max_width);

        let css_width = scroll.width.max(1);
        let css_height = scroll.height.max(1);
        let scale = f64::from(viewport_width) / f64::from(css_width);

        let scaled_height = (f64::from(css_height) * scale).ceil();
        let viewport_height = clamp_px(scaled_height, engine_max);

        let scaled_tile = (f64::from(reference_page_height_px(params.dpi)) * scale).ceil();
        let tile_height = clamp_px(scaled_tile, engine_max);

        let mut tiles = Vec::new();
        let mut y = 0u32;
        while y < viewport_height {
            let height = tile_height.min(viewport_height - y);
            tiles.push(Tile {
                index: tiles.len(),
                y,
                height,
            });
            y = y.saturating_add(tile_height);
        }

        Self {
            viewport_width,
            scale,
            viewport_height,
            tile_height,
            css_width,
            tiles,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Viewport that lays out the whole planned height at `scale`
    pub fn viewport(&self) -> ViewportSpec {
        let css_height = (f64::from(self.viewport_height) / self.scale).ceil();
        ViewportSpec {
            css_width: self.css_width,
            css_height: clamp_px(css_height, u32::MAX),
            scale: self.scale,
        }
    }
}

fn clamp_px(value: f64, max: u32) -> u32 {
    if value.is_nan() || value < 1.0 {
        1
    } else if value >= f64::from(max) {
        max
    } else {
        value as u32
    }
}

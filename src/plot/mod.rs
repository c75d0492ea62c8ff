//! PNG figures drawn with `plotters`.
//!
//! Every figure is a row of panels on a white bitmap. Multi-panel figures
//! carry a bold `a`, `b`, ... in the top-left corner of each panel.

mod bars;
mod boxplot;
mod scatter3d;

pub use bars::{draw_bar_panels, BarPanel, BarSeries};
pub use boxplot::{draw_box_panels, BoxGroup, BoxPanel};
pub use scatter3d::{draw_scatter_3d, ScatterAxes, ScatterGroup};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const ENGLISH_COLOR: RGBColor = RGBColor(0x66, 0xc2, 0xa5);
pub const CHINESE_COLOR: RGBColor = RGBColor(0xfc, 0x8d, 0x62);
pub const MEAN_MARKER_COLOR: RGBColor = RGBColor(0xd6, 0x27, 0x28);
pub const BOX_FILL_COLOR: RGBColor = RGBColor(0xa6, 0xce, 0xe3);

/// Four samples of the viridis colour map, one per cluster.
pub const VIRIDIS: [RGBColor; 4] = [
    RGBColor(0x44, 0x01, 0x54),
    RGBColor(0x31, 0x68, 0x8e),
    RGBColor(0x35, 0xb7, 0x79),
    RGBColor(0xfd, 0xe7, 0x25),
];

const FONT: &str = "sans-serif";

/// Pixel size of a rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl FigureSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Font size scaled to the figure height.
    fn font(&self, fraction: f64) -> u32 {
        ((self.height as f64 * fraction).round() as u32).max(8)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}

/// `a` for the first panel, `b` for the second and so on.
pub fn panel_letter(index: usize) -> String {
    char::from(b'a' + (index % 26) as u8).to_string()
}

fn draw_panel_letter(
    area: &DrawingArea<BitMapBackend, Shift>,
    index: usize,
    size: FigureSize,
) -> Result<()> {
    let font_size = size.font(0.035);
    area.draw(&Text::new(
        panel_letter(index),
        (font_size as i32 / 2, font_size as i32 / 2),
        (FONT, font_size as f64).into_font().style(FontStyle::Bold),
    ))?;
    Ok(())
}

/// Maps a fractional axis position to the category drawn there.
fn category_label(categories: &[String], position: f64) -> String {
    let rounded = position.round();
    if (position - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    categories
        .get(rounded as usize)
        .cloned()
        .unwrap_or_default()
}

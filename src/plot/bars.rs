use anyhow::Result;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::info;

use super::{category_label, draw_panel_letter, ensure_parent, FigureSize, FONT};

#[derive(Debug, Clone)]
pub struct BarSeries {
    pub name: String,
    pub color: RGBColor,
    /// One value per category of the panel.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BarPanel {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

/// Total width of one category's bars on the axis.
const GROUP_WIDTH: f64 = 0.8;

/// Grouped bars, one panel per entry, each with a legend of its series.
pub fn draw_bar_panels(
    path: &Path,
    size: FigureSize,
    panels: &[BarPanel],
    y_range: Range<f64>,
    y_label: &str,
) -> Result<()> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, size.as_tuple()).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, panels.len().max(1)));
    let labelled = panels.len() > 1;

    for (index, (panel, area)) in panels.iter().zip(areas.iter()).enumerate() {
        let n = panel.categories.len().max(1) as f64;
        let bar_width = GROUP_WIDTH / panel.series.len().max(1) as f64;

        let mut builder = ChartBuilder::on(area);
        if !panel.title.is_empty() {
            builder.caption(&panel.title, (FONT, size.font(0.025)));
        }
        let mut chart = builder
            .margin(size.font(0.02))
            .x_label_area_size(size.font(0.07))
            .y_label_area_size(size.font(0.07))
            .build_cartesian_2d(-0.5..(n - 0.5), y_range.clone())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(panel.categories.len().max(1))
            .x_label_formatter(&|x| category_label(&panel.categories, *x))
            .y_desc(y_label)
            .label_style((FONT, size.font(0.018)))
            .axis_desc_style((FONT, size.font(0.022)))
            .draw()?;

        for (s, series) in panel.series.iter().enumerate() {
            let offset = -GROUP_WIDTH / 2.0 + s as f64 * bar_width;
            let color = series.color;
            chart
                .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                    let left = i as f64 + offset;
                    Rectangle::new([(left, 0.0), (left + bar_width, *v)], color.filled())
                }))?
                .label(series.name.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, size.font(0.018)))
            .draw()?;

        if labelled {
            draw_panel_letter(area, index, size)?;
        }
    }

    root.present()?;
    info!("Figure saved to {:?}", path);
    Ok(())
}

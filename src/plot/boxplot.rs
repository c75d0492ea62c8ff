use anyhow::Result;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::info;

use super::{
    category_label, draw_panel_letter, ensure_parent, FigureSize, BOX_FILL_COLOR, FONT,
    MEAN_MARKER_COLOR,
};
use crate::stats::BoxStats;

/// One box of a box-plot panel. Groups without data keep their slot on the
/// axis but draw nothing.
#[derive(Debug, Clone)]
pub struct BoxGroup {
    pub label: String,
    pub stats: Option<BoxStats>,
}

#[derive(Debug, Clone)]
pub struct BoxPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub groups: Vec<BoxGroup>,
}

const BOX_HALF_WIDTH: f64 = 0.3;
const CAP_HALF_WIDTH: f64 = 0.15;

/// Draws the panels side by side with a shared value axis and a red mean
/// marker on every box.
pub fn draw_box_panels(
    path: &Path,
    size: FigureSize,
    panels: &[BoxPanel],
    y_range: Range<f64>,
) -> Result<()> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, size.as_tuple()).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, panels.len().max(1)));
    let labelled = panels.len() > 1;

    for (index, (panel, area)) in panels.iter().zip(areas.iter()).enumerate() {
        let labels: Vec<String> = panel.groups.iter().map(|g| g.label.clone()).collect();
        let n = panel.groups.len().max(1) as f64;

        let mut builder = ChartBuilder::on(area);
        if !panel.title.is_empty() {
            builder.caption(&panel.title, (FONT, size.font(0.025)));
        }
        let mut chart = builder
            .margin(size.font(0.02))
            .x_label_area_size(size.font(0.08))
            .y_label_area_size(size.font(0.07))
            .build_cartesian_2d(-0.5..(n - 0.5), y_range.clone())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(panel.groups.len().max(1))
            .x_label_formatter(&|x| category_label(&labels, *x))
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .label_style((FONT, size.font(0.018)))
            .axis_desc_style((FONT, size.font(0.022)))
            .draw()?;

        for (i, group) in panel.groups.iter().enumerate() {
            let Some(stats) = group.stats else {
                continue;
            };
            let x = i as f64;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - BOX_HALF_WIDTH, stats.q1), (x + BOX_HALF_WIDTH, stats.q3)],
                BOX_FILL_COLOR.filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - BOX_HALF_WIDTH, stats.q1), (x + BOX_HALF_WIDTH, stats.q3)],
                BLACK.stroke_width(1),
            )))?;

            let segments = [
                vec![(x - BOX_HALF_WIDTH, stats.median), (x + BOX_HALF_WIDTH, stats.median)],
                vec![(x, stats.q3), (x, stats.whisker_high)],
                vec![(x, stats.q1), (x, stats.whisker_low)],
                vec![
                    (x - CAP_HALF_WIDTH, stats.whisker_high),
                    (x + CAP_HALF_WIDTH, stats.whisker_high),
                ],
                vec![
                    (x - CAP_HALF_WIDTH, stats.whisker_low),
                    (x + CAP_HALF_WIDTH, stats.whisker_low),
                ],
            ];
            chart.draw_series(
                segments
                    .into_iter()
                    .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
            )?;

            chart.draw_series(std::iter::once(Circle::new(
                (x, stats.mean),
                size.font(0.006),
                MEAN_MARKER_COLOR.filled(),
            )))?;
        }

        if labelled {
            draw_panel_letter(area, index, size)?;
        }
    }

    root.present()?;
    info!("Figure saved to {:?}", path);
    Ok(())
}

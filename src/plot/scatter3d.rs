use anyhow::Result;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::info;

use super::{ensure_parent, FigureSize, FONT};

#[derive(Debug, Clone)]
pub struct ScatterGroup {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64, f64)>,
}

/// Axis names in x, y, z order.
#[derive(Debug, Clone)]
pub struct ScatterAxes {
    pub x: String,
    pub y: String,
    pub z: String,
}

/// Range covering every point with a small pad, `0..1` when there are none.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    (lo - pad)..(hi + pad)
}

pub fn draw_scatter_3d(
    path: &Path,
    size: FigureSize,
    title: &str,
    axes: &ScatterAxes,
    groups: &[ScatterGroup],
) -> Result<()> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, size.as_tuple()).into_drawing_area();
    root.fill(&WHITE)?;

    let all = || groups.iter().flat_map(|g| g.points.iter());
    let x_range = padded_range(all().map(|p| p.0));
    let y_range = padded_range(all().map(|p| p.1));
    let z_range = padded_range(all().map(|p| p.2));

    // The 3D axes carry no description, so the caption names them.
    let caption = format!("{} (x: {}, y: {}, z: {})", title, axes.x, axes.y, axes.z);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, (FONT, size.font(0.02)))
        .margin(size.font(0.02))
        .build_cartesian_3d(x_range, y_range, z_range)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.3;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .label_style((FONT, size.font(0.014)))
        .draw()?;

    let radius = size.font(0.005);
    for group in groups {
        let color = group.color;
        chart
            .draw_series(
                group
                    .points
                    .iter()
                    .map(|&(x, y, z)| Circle::new((x, y, z), radius, color.mix(0.8).filled())),
            )?
            .label(group.label.as_str())
            .legend(move |(x, y)| Circle::new((x + 8, y), 6, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, size.font(0.016)))
        .draw()?;

    root.present()?;
    info!("Figure saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let r = padded_range([0.0, 10.0].into_iter());
        assert!((r.start - -0.5).abs() < 1e-12);
        assert!((r.end - 10.5).abs() < 1e-12);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);

        let wide = padded_range([0.0, 100.0].into_iter());
        assert!((wide.start - -5.0).abs() < 1e-12);
    }
}

//! Interval binning and the box-plot figures built on it.

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::{EarlyAccessSettings, FigureSettings, ScoreGapSettings};
use crate::plot::{draw_box_panels, BoxGroup, BoxPanel, FigureSize};
use crate::stats::BoxStats;
use crate::workbook::{Cell, Sheet, Table, WorkbookReader, WorkbookWriter};

const SCORE_GAP_LABEL: &str = "Score Gap (ENG - CHN)";
const EARLY_ACCESS_RANGE: std::ops::Range<f64> = 10.0..110.0;

/// Left-closed, right-open intervals between consecutive edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSpec {
    edges: Vec<f64>,
}

impl BinSpec {
    /// Edges must be finite and strictly increasing, at least two of them.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            bail!("A bin specification needs at least two edges");
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
            bail!("Bin edges must be finite and strictly increasing: {:?}", edges);
        }
        Ok(Self { edges })
    }

    /// Edges `start, start + step, ..., end`.
    pub fn stepped(start: f64, end: f64, step: f64) -> Result<Self> {
        if step <= 0.0 {
            bail!("Bin step must be positive");
        }
        let count = ((end - start) / step).round() as usize;
        Self::new((0..=count).map(|i| start + step * i as f64).collect())
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the interval holding `value`; values outside every interval
    /// (and NaN) have none.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        self.edges
            .windows(2)
            .position(|w| value >= w[0] && value < w[1])
    }

    /// `"[lo, hi)"` for every interval.
    pub fn labels(&self) -> Vec<String> {
        self.edges
            .windows(2)
            .map(|w| format!("[{}, {})", format_edge(w[0]), format_edge(w[1])))
            .collect()
    }
}

fn format_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{:.0}", edge)
    } else {
        edge.to_string()
    }
}

/// Distribution of the values that fell into one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub label: String,
    pub stats: Option<BoxStats>,
}

impl BucketSummary {
    pub fn count(&self) -> usize {
        self.stats.map(|s| s.count).unwrap_or(0)
    }
}

/// Groups `values` by the interval of the matching entry in `keys`. Pairs
/// with a missing value or key are ignored. Every interval is reported, empty
/// ones without statistics.
pub fn bucket_summary(
    values: &[Option<f64>],
    keys: &[Option<f64>],
    bins: &BinSpec,
) -> Vec<BucketSummary> {
    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); bins.len()];
    for (value, key) in values.iter().zip(keys.iter()) {
        let (Some(value), Some(key)) = (value, key) else {
            continue;
        };
        if let Some(bin) = bins.bin_of(*key) {
            buckets[bin].push(*value);
        }
    }

    bins.labels()
        .into_iter()
        .zip(buckets)
        .map(|(label, values)| BucketSummary {
            label,
            stats: BoxStats::from_values(&values),
        })
        .collect()
}

pub fn summary_table(key_name: &str, buckets: &[BucketSummary]) -> Table {
    let mut table = Table::new([
        key_name,
        "Count",
        "Mean",
        "Q1",
        "Median",
        "Q3",
        "Lower Whisker",
        "Upper Whisker",
    ]);
    for bucket in buckets {
        let mut row: Vec<Cell> = vec![bucket.label.as_str().into(), bucket.count().into()];
        match bucket.stats {
            Some(s) => row.extend(
                [s.mean, s.q1, s.median, s.q3, s.whisker_low, s.whisker_high].map(Cell::from),
            ),
            None => row.extend(std::iter::repeat(Cell::Empty).take(6)),
        }
        table.push_row(row);
    }
    table
}

/// A value range covering every box and mean marker of the panels, padded by
/// five percent on each side.
pub fn shared_range(panels: &[BoxPanel]) -> std::ops::Range<f64> {
    let (lo, hi) = panels
        .iter()
        .flat_map(|p| p.groups.iter())
        .filter_map(|g| g.stats)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (
                lo.min(s.whisker_low).min(s.mean),
                hi.max(s.whisker_high).max(s.mean),
            )
        });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad)..(hi + pad)
}

fn box_panel(title: &str, x_label: &str, y_label: &str, buckets: &[BucketSummary]) -> BoxPanel {
    BoxPanel {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        groups: buckets
            .iter()
            .map(|b| BoxGroup {
                label: b.label.clone(),
                stats: b.stats,
            })
            .collect(),
    }
}

fn require_columns(table: &Table, sheet: &str, columns: &[&str]) -> Result<()> {
    for column in columns {
        if table.column_index(column).is_none() {
            bail!("Sheet '{}' has no column '{}'", sheet, column);
        }
    }
    Ok(())
}

/// Score gap by review-score decile and by price band, as two box-plot
/// panels on one value axis, plus the per-interval summaries.
pub fn run_score_gap_figure(settings: &ScoreGapSettings, figures: &FigureSettings) -> Result<()> {
    let mut reader = WorkbookReader::open(&settings.input)?;
    let table = reader.read_sheet(&settings.sheet)?;
    require_columns(&table, &settings.sheet, &["ScoreGap", "reviewScore", "price"])?;

    let gaps = table.numeric_column("ScoreGap");
    let by_score = bucket_summary(
        &gaps,
        &table.numeric_column("reviewScore"),
        &BinSpec::stepped(0.0, 100.0, 10.0)?,
    );
    let by_price = bucket_summary(
        &gaps,
        &table.numeric_column("price"),
        &BinSpec::stepped(0.0, 70.0, 10.0)?,
    );

    for (name, buckets) in [("review score", &by_score), ("price", &by_price)] {
        let used: usize = buckets.iter().map(BucketSummary::count).sum();
        info!("Grouped {} of {} titles by {}", used, table.len(), name);
        if used == 0 {
            warn!("No titles fall into any {} interval", name);
        }
    }

    let mut writer = WorkbookWriter::new(&settings.output);
    writer.add_sheet(Sheet::from_table(
        "By Review Score",
        summary_table("Review Score", &by_score),
    ));
    writer.add_sheet(Sheet::from_table("By Price", summary_table("Price", &by_price)));
    writer.flush()?;

    let panels = [
        box_panel("", "Global Review Score", SCORE_GAP_LABEL, &by_score),
        box_panel("", "Price Interval", SCORE_GAP_LABEL, &by_price),
    ];
    draw_box_panels(
        &settings.figure,
        FigureSize::new(figures.width, figures.height),
        &panels,
        shared_range(&panels),
    )
}

/// Chinese and English review scores for titles outside and inside Early
/// Access.
pub fn early_access_panels(table: &Table) -> Vec<BoxPanel> {
    let flags = table.numeric_column("EA?");
    let split = |column: &str| -> [Vec<f64>; 2] {
        let mut groups = [Vec::new(), Vec::new()];
        for (flag, score) in flags.iter().zip(table.numeric_column(column)) {
            let Some(score) = score else { continue };
            match flag {
                Some(f) if *f == 0.0 => groups[0].push(score),
                Some(f) if *f == 1.0 => groups[1].push(score),
                _ => {}
            }
        }
        groups
    };

    [
        ("ChineseReviewScore", "Chinese Review Score by Early Access Status"),
        ("EnglishReviewScore", "English Review Score by Early Access Status"),
    ]
    .into_iter()
    .map(|(column, title)| {
        let [regular, early] = split(column);
        BoxPanel {
            title: title.to_string(),
            x_label: String::new(),
            y_label: "Scores".to_string(),
            groups: vec![
                BoxGroup {
                    label: "Non-Early Access".to_string(),
                    stats: BoxStats::from_values(&regular),
                },
                BoxGroup {
                    label: "Early Access".to_string(),
                    stats: BoxStats::from_values(&early),
                },
            ],
        }
    })
    .collect()
}

pub fn run_early_access_figure(
    settings: &EarlyAccessSettings,
    figures: &FigureSettings,
) -> Result<()> {
    let mut reader = WorkbookReader::open(&settings.input)?;
    let table = reader.read_sheet(&settings.sheet)?;
    require_columns(
        &table,
        &settings.sheet,
        &["EA?", "ChineseReviewScore", "EnglishReviewScore"],
    )?;

    let panels = early_access_panels(&table);
    for panel in &panels {
        for group in &panel.groups {
            match group.stats {
                Some(s) => info!(
                    "{} / {}: n = {}, mean = {:.2}",
                    panel.title, group.label, s.count, s.mean
                ),
                None => warn!("{} / {}: no scores", panel.title, group.label),
            }
        }
    }

    draw_box_panels(
        &settings.figure,
        FigureSize::new(figures.width, figures.height),
        &panels,
        EARLY_ACCESS_RANGE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_are_left_closed() {
        let bins = BinSpec::stepped(0.0, 70.0, 10.0).unwrap();
        assert_eq!(bins.len(), 7);
        assert_eq!(bins.bin_of(0.0), Some(0));
        assert_eq!(bins.bin_of(9.99), Some(0));
        assert_eq!(bins.bin_of(10.0), Some(1));
        assert_eq!(bins.bin_of(69.9), Some(6));
        assert_eq!(bins.bin_of(70.0), None);
        assert_eq!(bins.bin_of(-0.01), None);
        assert_eq!(bins.bin_of(f64::NAN), None);
    }

    #[test]
    fn test_bin_labels() {
        let bins = BinSpec::stepped(0.0, 100.0, 10.0).unwrap();
        let labels = bins.labels();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "[0, 10)");
        assert_eq!(labels[9], "[90, 100)");
        assert_eq!(BinSpec::new(vec![0.5, 1.0]).unwrap().labels(), vec!["[0.5, 1)"]);
    }

    #[test]
    fn test_invalid_edges() {
        assert!(BinSpec::new(vec![1.0]).is_err());
        assert!(BinSpec::new(vec![0.0, 10.0, 10.0]).is_err());
        assert!(BinSpec::stepped(0.0, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_bucket_summary() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(100.0), None, Some(7.0)];
        let keys = vec![Some(5.0), Some(15.0), Some(12.0), Some(70.0), Some(5.0), None];
        let bins = BinSpec::stepped(0.0, 70.0, 10.0).unwrap();
        let buckets = bucket_summary(&values, &keys, &bins);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].count(), 1);
        assert_eq!(buckets[1].count(), 2);
        assert_eq!(buckets[1].stats.unwrap().mean, 2.5);
        assert!(buckets[2].stats.is_none());
        let total: usize = buckets.iter().map(BucketSummary::count).sum();
        assert_eq!(total, 3);

        let table = summary_table("Price", &buckets);
        assert_eq!(table.len(), 7);
        assert_eq!(table.get(1, "Price"), &Cell::Text("[10, 20)".into()));
        assert_eq!(table.get(1, "Median").as_f64(), Some(2.5));
        assert_eq!(table.get(2, "Mean"), &Cell::Empty);
    }

    #[test]
    fn test_early_access_split() {
        let mut table = Table::new(["EA?", "ChineseReviewScore", "EnglishReviewScore"]);
        table.push_row(vec![0.0.into(), 60.0.into(), 80.0.into()]);
        table.push_row(vec![0.0.into(), 70.0.into(), 90.0.into()]);
        table.push_row(vec![1.0.into(), 50.0.into(), Cell::Empty]);
        table.push_row(vec![2.0.into(), 10.0.into(), 10.0.into()]);

        let panels = early_access_panels(&table);
        assert_eq!(panels.len(), 2);
        let chinese = &panels[0];
        assert_eq!(chinese.groups[0].stats.unwrap().mean, 65.0);
        assert_eq!(chinese.groups[1].stats.unwrap().count, 1);
        assert!(panels[1].groups[1].stats.is_none());
    }

    #[test]
    fn test_shared_range_covers_all_panels() {
        let bucket = |label: &str, values: &[f64]| BucketSummary {
            label: label.to_string(),
            stats: BoxStats::from_values(values),
        };
        let a = box_panel("", "", "", &[bucket("x", &[0.0, 10.0])]);
        let b = box_panel("", "", "", &[bucket("y", &[-20.0, 40.0])]);
        let range = shared_range(&[a, b]);
        assert!(range.start <= -20.0 && range.end >= 40.0);
        assert_eq!(shared_range(&[]), 0.0..1.0);
    }
}

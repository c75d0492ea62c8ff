//! English vs Chinese dominant-emotion comparison, split by recommendation.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli_style::{print_key_value, print_section_header, TableBuilder};
use crate::config::{EmotionCompareSettings, FigureSettings};
use crate::model::{Emotion, Sentiment};
use crate::plot::{draw_bar_panels, BarPanel, BarSeries, FigureSize, CHINESE_COLOR, ENGLISH_COLOR};
use crate::stats::{
    bonferroni_all, chi_square_independence, fisher_exact, significance_stars, ChiSquareResult,
    Crosstab, StatsError, SIGNIFICANCE_LEGEND,
};
use crate::workbook::{Sheet, Table, WorkbookReader, WorkbookWriter};

const OVERALL_COLUMNS: [&str; 4] = ["Test Type", "Chi-square", "p-value", "Significance"];
const DETAIL_COLUMNS: [&str; 5] = [
    "Emotion",
    "English Rate",
    "Chinese Rate",
    "Adjusted p-value",
    "Significance",
];
const DETAIL_START_ROW: u32 = 5;
const COLUMN_WIDTH: f64 = 18.0;

/// One scored review as needed for the comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionObservation {
    pub recommendation: Sentiment,
    pub language: String,
    /// Raw `dominant_emotion` label; `error` for failed classifications.
    pub dominant: String,
}

/// Per-emotion result inside one recommendation group.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionRow {
    pub emotion: Emotion,
    pub english_rate: f64,
    pub chinese_rate: f64,
    pub p_raw: f64,
    pub p_adjusted: f64,
    pub significance: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupComparison {
    pub group: Sentiment,
    pub english_reviews: u64,
    pub chinese_reviews: u64,
    pub overall: ChiSquareResult,
    pub emotions: Vec<EmotionRow>,
}

impl GroupComparison {
    /// "Positive Reviews" or "Negative Reviews".
    pub fn title(&self) -> String {
        group_title(self.group)
    }
}

fn group_title(group: Sentiment) -> String {
    match group {
        Sentiment::Positive => "Positive Reviews".to_string(),
        Sentiment::Negative => "Negative Reviews".to_string(),
    }
}

/// Collects rows whose `is_recommended` cell reads `positive` or `negative`.
pub fn collect_observations(sheets: &[(String, Table)]) -> Vec<EmotionObservation> {
    let mut observations = Vec::new();
    for (_, table) in sheets {
        for row in 0..table.len() {
            let Some(recommendation) = table
                .get(row, "is_recommended")
                .as_text()
                .and_then(|s| s.parse::<Sentiment>().ok())
            else {
                continue;
            };
            observations.push(EmotionObservation {
                recommendation,
                language: table
                    .get(row, "language")
                    .as_text()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                dominant: table
                    .get(row, "dominant_emotion")
                    .as_text()
                    .unwrap_or_default(),
            });
        }
    }
    observations
}

/// Languages × emotions for one group. Reviews in other languages are
/// dropped; reviews without a known emotion count toward their language's
/// total only.
fn crosstab_for(
    observations: &[EmotionObservation],
    group: Sentiment,
    english: &str,
    chinese: &str,
) -> Crosstab<String, Emotion> {
    let mut table = Crosstab::new([english.to_string(), chinese.to_string()], Emotion::ALL);
    for obs in observations.iter().filter(|o| o.recommendation == group) {
        match obs.dominant.parse::<Emotion>() {
            Ok(emotion) => {
                table.increment(&obs.language, &emotion);
            }
            Err(_) => {
                table.count_untabulated(&obs.language);
            }
        }
    }
    table
}

/// Chi-square over the whole table, then a Fisher exact test per emotion with
/// a Bonferroni correction across the eight emotions.
pub fn compare_group(
    observations: &[EmotionObservation],
    group: Sentiment,
    english: &str,
    chinese: &str,
) -> Result<GroupComparison, StatsError> {
    let table = crosstab_for(observations, group, english, chinese);
    debug!(
        "{}: {} reviews with a known emotion",
        group_title(group),
        table.total()
    );
    let english = english.to_string();
    let chinese = chinese.to_string();

    let overall = chi_square_independence(&table.to_matrix())?;

    let raw: Vec<f64> = Emotion::ALL
        .iter()
        .map(|e| fisher_exact(table.one_vs_rest(&english, &chinese, e)))
        .collect::<Result<_, _>>()?;
    let adjusted = bonferroni_all(&raw);

    let emotions = Emotion::ALL
        .iter()
        .zip(raw.iter().zip(adjusted.iter()))
        .map(|(&emotion, (&p_raw, &p_adjusted))| EmotionRow {
            emotion,
            english_rate: table.rate(&english, &emotion),
            chinese_rate: table.rate(&chinese, &emotion),
            p_raw,
            p_adjusted,
            significance: significance_stars(p_adjusted),
        })
        .collect();

    Ok(GroupComparison {
        group,
        english_reviews: table.row_observations(&english),
        chinese_reviews: table.row_observations(&chinese),
        overall,
        emotions,
    })
}

pub fn legend_sheet() -> Sheet {
    let mut table = Table::new(["Symbol", "Meaning"]);
    for (symbol, meaning) in SIGNIFICANCE_LEGEND {
        table.push_row(vec![symbol.into(), meaning.into()]);
    }
    Sheet::from_table("Legend", table)
}

/// Title in the first row, the overall test below it and the per-emotion
/// block further down.
pub fn group_sheet(comparison: &GroupComparison) -> Sheet {
    let title = comparison.title();

    let mut overall = Table::new(OVERALL_COLUMNS);
    overall.push_row(vec![
        "Chi-square test".into(),
        format!("{:.3}", comparison.overall.statistic).into(),
        format!("{:.5}", comparison.overall.p_value).into(),
        significance_stars(comparison.overall.p_value).into(),
    ]);

    let mut detail = Table::new(DETAIL_COLUMNS);
    for row in &comparison.emotions {
        detail.push_row(vec![
            row.emotion.name().into(),
            format!("{:.1}%", row.english_rate).into(),
            format!("{:.1}%", row.chinese_rate).into(),
            format!("{:.5}", row.p_adjusted).into(),
            row.significance.into(),
        ]);
    }

    Sheet::new(title.as_str())
        .with_text(0, 0, format!("{} Statistical Analysis", title))
        .with_table(1, overall)
        .with_table(DETAIL_START_ROW, detail)
        .with_column_width(COLUMN_WIDTH)
}

fn bar_panel(comparison: &GroupComparison) -> BarPanel {
    let rates = |pick: fn(&EmotionRow) -> f64| -> Vec<f64> {
        comparison.emotions.iter().map(pick).collect()
    };
    BarPanel {
        title: String::new(),
        categories: comparison
            .emotions
            .iter()
            .map(|r| r.emotion.name().to_string())
            .collect(),
        series: vec![
            BarSeries {
                name: "English".to_string(),
                color: ENGLISH_COLOR,
                values: rates(|r| r.english_rate),
            },
            BarSeries {
                name: "Chinese".to_string(),
                color: CHINESE_COLOR,
                values: rates(|r| r.chinese_rate),
            },
        ],
    }
}

fn print_comparison(comparison: &GroupComparison) {
    print_section_header(&comparison.title());
    print_key_value(
        "Reviews (english / schinese)",
        &format!("{} / {}", comparison.english_reviews, comparison.chinese_reviews),
    );
    print_key_value(
        "Chi-square",
        &format!(
            "{:.3} (dof {}, p = {:.5}) {}",
            comparison.overall.statistic,
            comparison.overall.dof,
            comparison.overall.p_value,
            significance_stars(comparison.overall.p_value)
        ),
    );

    let mut console = TableBuilder::new(DETAIL_COLUMNS.to_vec());
    for row in &comparison.emotions {
        let cells = [
            row.emotion.name().to_string(),
            format!("{:.1}%", row.english_rate),
            format!("{:.1}%", row.chinese_rate),
            format!("{:.5}", row.p_adjusted),
            row.significance.to_string(),
        ];
        console.add_row(cells.iter().map(String::as_str).collect());
    }
    console.print();
}

/// Compares both recommendation groups, writes the analysis workbook group
/// by group and draws the two-panel bar chart.
pub fn run_emotion_compare(
    settings: &EmotionCompareSettings,
    figures: &FigureSettings,
) -> Result<Vec<GroupComparison>> {
    let mut reader = WorkbookReader::open(&settings.input)?;
    let sheets = reader.read_sheets_except(&settings.skip_sheets)?;
    let observations = collect_observations(&sheets);
    info!(
        "Loaded {} labelled reviews from {} sheets",
        observations.len(),
        sheets.len()
    );

    let mut writer = WorkbookWriter::new(&settings.output);
    writer.add_sheet(legend_sheet());

    let mut comparisons = Vec::new();
    for group in Sentiment::ALL {
        let comparison = compare_group(
            &observations,
            group,
            &settings.english_language,
            &settings.chinese_language,
        )?;
        if comparison.english_reviews + comparison.chinese_reviews == 0 {
            warn!("No {} reviews in the selected languages", group);
        }

        print_comparison(&comparison);
        writer.add_sheet(group_sheet(&comparison));
        writer.flush()?;
        comparisons.push(comparison);
    }
    info!("Analysis saved to {:?}", settings.output);

    let panels: Vec<BarPanel> = comparisons.iter().map(bar_panel).collect();
    draw_bar_panels(
        &settings.figure,
        FigureSize::new(figures.width, figures.height),
        &panels,
        0.0..100.0,
        "Percentage (%)",
    )?;

    Ok(comparisons)
}

use anyhow::Result;
use tracing::{info, warn};

use super::classifier::EmotionClassifier;
use crate::cli_style::progress_bar;
use crate::config::ClassifySettings;
use crate::model::{Emotion, EmotionScores, Sentiment};
use crate::workbook::{Cell, Sheet, Table, WorkbookReader, WorkbookWriter};

const LEADING_COLUMNS: [&str; 7] = [
    "review_id",
    "content",
    "language",
    "is_recommended",
    "sentiment",
    "confidence",
    "dominant_emotion",
];

/// Totals of a classification run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifySummary {
    pub sheets: usize,
    pub reviews: usize,
    /// Reviews that fell back to the default record.
    pub failed: usize,
}

/// Maps a Steam "voted up" cell to its polarity; anything that is not a
/// recognisable boolean maps to `None`.
pub fn recommendation_label(cell: &Cell) -> Option<Sentiment> {
    cell.as_bool().map(Sentiment::from_recommendation)
}

pub fn emotion_columns() -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(Emotion::ALL.iter().map(|e| e.name().to_string()))
        .collect()
}

fn output_row(source: &Table, row: usize, scores: &EmotionScores) -> Vec<Cell> {
    let mut cells = vec![
        source.get(row, "review_id").clone(),
        source.get(row, "content").clone(),
        source.get(row, "language").clone(),
        recommendation_label(source.get(row, "is_recommended"))
            .map(|s| Cell::from(s.as_str()))
            .unwrap_or_default(),
        scores.sentiment.as_str().into(),
        scores.confidence.into(),
        scores.dominant.as_str().into(),
    ];
    cells.extend(scores.intensities.iter().map(|v| Cell::from(*v)));
    cells
}

/// Classifies every review of every game sheet and writes one scored sheet
/// per game. The output file is re-written after each game.
pub async fn classify_workbook(
    settings: &ClassifySettings,
    classifier: &EmotionClassifier,
) -> Result<ClassifySummary> {
    let generator = classifier.generator();
    match generator.health_check().await {
        Ok(()) => info!(
            "Using {} model {}",
            generator.name(),
            generator.model()
        ),
        Err(e) => warn!(
            "{} health check failed, continuing anyway: {}",
            generator.name(),
            e
        ),
    }

    let mut reader = WorkbookReader::open(&settings.input)?;
    let sheets = reader.read_sheets_except(&settings.skip_sheets)?;
    let mut writer = WorkbookWriter::new(&settings.output);
    let mut summary = ClassifySummary::default();

    for (name, table) in sheets {
        let pb = progress_bar(table.len(), &format!("Classifying {}", name));
        let mut scored = Table::new(emotion_columns());

        for row in 0..table.len() {
            let content = table.get(row, "content").as_text().unwrap_or_default();
            let scores = classifier.classify(&content).await;
            if scores.is_failed() {
                summary.failed += 1;
            }
            scored.push_row(output_row(&table, row, &scores));
            pb.inc(1);
        }
        pb.finish_and_clear();

        summary.sheets += 1;
        summary.reviews += scored.len();
        info!("Sheet {}: classified {} reviews", name, scored.len());

        writer.add_sheet(Sheet::from_table(name, scored));
        writer.flush()?;
    }

    if summary.failed > 0 {
        warn!(
            "{} of {} reviews fell back to the default record",
            summary.failed, summary.reviews
        );
    }
    Ok(summary)
}

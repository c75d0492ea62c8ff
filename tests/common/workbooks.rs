//! Input workbooks for the analysis commands, written with the crate's own
//! writer.

#![allow(dead_code)]

use regional_sentiment::workbook::{Cell, Sheet, Table, WorkbookWriter};
use std::path::Path;

/// `Sheet1` with three languages over four games and a trailing global row.
pub fn write_regional_workbook(path: &Path) {
    let mut table = Table::new(["Language", "Game 1", "Game 2", "Game 3", "Game 4"]);
    let rows: [(&str, [Cell; 4]); 4] = [
        ("schinese", [60.0.into(), 65.0.into(), 55.0.into(), 70.0.into()]),
        ("english", [88.0.into(), 92.0.into(), 90.0.into(), 86.0.into()]),
        ("german", [80.0.into(), Cell::Empty, "n/a".into(), Cell::Empty]),
        ("Global", [80.0.into(), 85.0.into(), 82.0.into(), 84.0.into()]),
    ];
    for (language, scores) in rows {
        let mut row = vec![Cell::from(language)];
        row.extend(scores);
        table.push_row(row);
    }

    let mut writer = WorkbookWriter::new(path);
    writer.add_sheet(Sheet::from_table("Sheet1", table));
    writer.flush().expect("Failed to write regional workbook");
}

fn scored_rows(rows: &[(&str, &str, &str)]) -> Table {
    let mut table = Table::new(["review_id", "is_recommended", "language", "dominant_emotion"]);
    for (i, (recommended, language, dominant)) in rows.iter().enumerate() {
        table.push_row(vec![
            format!("r{}", i).into(),
            (*recommended).into(),
            (*language).into(),
            (*dominant).into(),
        ]);
    }
    table
}

/// Two game sheets of scored reviews plus a summary sheet that must be
/// skipped.
pub fn write_scored_workbook(path: &Path) {
    let mut first = Vec::new();
    first.extend(std::iter::repeat(("positive", "english", "Joy")).take(8));
    first.extend(std::iter::repeat(("positive", "english", "Trust")).take(2));
    first.extend(std::iter::repeat(("positive", "schinese", "Joy")).take(1));
    first.extend(std::iter::repeat(("positive", "schinese", "Trust")).take(5));

    let second = vec![
        ("negative", "english", "Anger"),
        ("negative", "english", "Anger"),
        ("negative", "schinese", "Sadness"),
        ("negative", "schinese", "error"),
        ("", "english", "Joy"),
        ("negative", "german", "Fear"),
    ];

    let mut summary = Table::new(["is_recommended", "language", "dominant_emotion"]);
    summary.push_row(vec!["positive".into(), "english".into(), "Fear".into()]);

    let mut writer = WorkbookWriter::new(path);
    writer.add_sheet(Sheet::from_table("1623730", scored_rows(&first)));
    writer.add_sheet(Sheet::from_table("2139460", scored_rows(&second)));
    writer.add_sheet(Sheet::from_table("0_Summary", summary));
    writer.flush().expect("Failed to write scored workbook");
}

/// `All` sheet with the columns used by the figures and the clustering.
pub fn write_games_workbook(path: &Path) {
    let mut table = Table::new([
        "steamId",
        "name",
        "ScoreGap",
        "price",
        "reviewScore",
        "medianPlaytime",
        "EA?",
        "ChineseReviewScore",
        "EnglishReviewScore",
    ]);
    for i in 0..24u64 {
        let cluster = i % 4;
        let gap = [-20.0, 0.0, 15.0, 30.0][cluster as usize] + (i as f64) * 0.1;
        let price = [5.0, 25.0, 45.0, 65.0][cluster as usize] + (i % 3) as f64;
        let score = [40.0, 60.0, 80.0, 95.0][cluster as usize] - (i % 5) as f64;
        let playtime: Cell = if i == 23 { Cell::Empty } else { (10.0 + i as f64).into() };
        table.push_row(vec![
            (1000 + i).into(),
            format!("Game {}", i).into(),
            gap.into(),
            price.into(),
            score.into(),
            playtime,
            ((i % 2) as f64).into(),
            (score - gap / 2.0).into(),
            (score + gap / 2.0).into(),
        ]);
    }

    let mut writer = WorkbookWriter::new(path);
    writer.add_sheet(Sheet::from_table("All", table));
    writer.flush().expect("Failed to write games workbook");
}

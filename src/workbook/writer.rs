use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::cell::{Cell, Table};

/// Excel refuses cells longer than this.
const MAX_CELL_CHARS: usize = 32_767;
const MAX_SHEET_NAME_CHARS: usize = 31;

#[derive(Debug, Clone)]
enum SheetItem {
    Text { row: u32, col: u16, text: String },
    Table { start_row: u32, table: Table },
}

/// One named worksheet: any number of tables and loose text cells.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    items: Vec<SheetItem>,
    column_width: Option<f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: sanitize_sheet_name(&name.into()),
            items: Vec::new(),
            column_width: None,
        }
    }

    /// A sheet holding a single table at the top-left corner.
    pub fn from_table(name: impl Into<String>, table: Table) -> Self {
        Self::new(name).with_table(0, table)
    }

    pub fn with_text(mut self, row: u32, col: u16, text: impl Into<String>) -> Self {
        self.items.push(SheetItem::Text {
            row,
            col,
            text: text.into(),
        });
        self
    }

    /// Places a table with its header row at `start_row`.
    pub fn with_table(mut self, start_row: u32, table: Table) -> Self {
        self.items.push(SheetItem::Table { start_row, table });
        self
    }

    /// Applies one width to every used column.
    pub fn with_column_width(mut self, width: f64) -> Self {
        self.column_width = Some(width);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn column_count(&self) -> u16 {
        self.items
            .iter()
            .map(|item| match item {
                SheetItem::Text { col, .. } => col + 1,
                SheetItem::Table { table, .. } => table.headers.len() as u16,
            })
            .max()
            .unwrap_or(0)
    }

    fn render(&self, worksheet: &mut Worksheet, header: &Format, datetime: &Format) -> Result<()> {
        worksheet.set_name(&self.name)?;

        for item in &self.items {
            match item {
                SheetItem::Text { row, col, text } => {
                    worksheet.write_string(*row, *col, truncate(text))?;
                }
                SheetItem::Table { start_row, table } => {
                    for (col, name) in table.headers.iter().enumerate() {
                        worksheet.write_string_with_format(
                            *start_row,
                            col as u16,
                            truncate(name),
                            header,
                        )?;
                    }
                    for (i, row) in table.rows.iter().enumerate() {
                        let row_idx = start_row + 1 + i as u32;
                        for (col, cell) in row.iter().enumerate() {
                            write_cell(worksheet, row_idx, col as u16, cell, datetime)?;
                        }
                    }
                }
            }
        }

        if let Some(width) = self.column_width {
            for col in 0..self.column_count() {
                worksheet.set_column_width(col, width)?;
            }
        }
        Ok(())
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    datetime: &Format,
) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Number(n) if n.is_finite() => {
            worksheet.write_number(row, col, *n)?;
        }
        Cell::Number(_) => {}
        Cell::Text(s) => {
            worksheet.write_string(row, col, truncate(s))?;
        }
        Cell::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, datetime)?;
        }
    }
    Ok(())
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Excel sheet names are limited to 31 characters and may not contain
/// `[ ] : * ? / \`.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Accumulates sheets and writes them all to one `.xlsx` file.
pub struct WorkbookWriter {
    path: PathBuf,
    sheets: Vec<Sheet>,
}

impl WorkbookWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a sheet, replacing any existing sheet with the same name.
    pub fn add_sheet(&mut self, sheet: Sheet) {
        if let Some(existing) = self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            *existing = sheet;
        } else {
            self.sheets.push(sheet);
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Writes every sheet collected so far, overwriting the file.
    pub fn flush(&self) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        if self.sheets.is_empty() {
            // An xlsx file needs at least one worksheet.
            workbook.add_worksheet();
        }
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            sheet
                .render(worksheet, &header, &datetime)
                .with_context(|| format!("Failed to render sheet '{}'", sheet.name))?;
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }
        workbook
            .save(&self.path)
            .with_context(|| format!("Failed to save workbook {:?}", self.path))?;

        debug!(
            "Saved {} sheet(s) to {:?}",
            self.sheet_count(),
            self.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::WorkbookReader;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("1623730"), "1623730");
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sanitize_sheet_name("  "), "Sheet");
    }

    #[test]
    fn test_add_sheet_replaces_same_name() {
        let dir = TempDir::new().unwrap();
        let mut writer = WorkbookWriter::new(&dir.path().join("out.xlsx"));
        writer.add_sheet(Sheet::from_table("a", Table::new(["x"])));
        writer.add_sheet(Sheet::from_table("a", Table::new(["y"])));
        assert_eq!(writer.sheet_count(), 1);
        assert_eq!(writer.sheets[0].name(), "a");
    }

    #[test]
    fn test_flush_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");

        let mut table = Table::new(["id", "score", "ok", "when", "note"]);
        let when = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        table.push_row(vec![
            "r1".into(),
            0.75.into(),
            true.into(),
            when.into(),
            Cell::Empty,
        ]);
        table.push_row(vec!["r2".into(), Cell::Number(f64::NAN), false.into()]);

        let mut writer = WorkbookWriter::new(&path);
        writer.add_sheet(Sheet::from_table("data", table));
        writer.add_sheet(
            Sheet::new("report")
                .with_text(0, 0, "Title")
                .with_table(2, Table::new(["k", "v"]))
                .with_column_width(18.0),
        );
        writer.flush().unwrap();

        let mut reader = WorkbookReader::open(&path).unwrap();
        assert_eq!(reader.sheet_names(), vec!["data", "report"]);

        let data = reader.read_sheet("data").unwrap();
        assert_eq!(data.headers, vec!["id", "score", "ok", "when", "note"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.get(0, "id"), &Cell::Text("r1".into()));
        assert_eq!(data.get(0, "score").as_f64(), Some(0.75));
        assert_eq!(data.get(0, "ok").as_bool(), Some(true));
        match data.get(0, "when") {
            Cell::DateTime(dt) => assert!((*dt - when).num_seconds().abs() <= 1),
            other => panic!("expected a datetime cell, got {:?}", other),
        }
        assert_eq!(data.get(1, "score"), &Cell::Empty);
    }

    #[test]
    fn test_flush_empty_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.xlsx");
        WorkbookWriter::new(&path).flush().unwrap();
        assert!(path.exists());
    }
}

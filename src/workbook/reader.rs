use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::cell::{Cell, Table};

/// Read access to an `.xlsx` workbook.
pub struct WorkbookReader {
    path: PathBuf,
    inner: Xlsx<BufReader<File>>,
}

impl WorkbookReader {
    pub fn open(path: &Path) -> Result<Self> {
        let inner: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("Failed to open workbook {:?}", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Reads a sheet, treating its first row as column headers.
    pub fn read_sheet(&mut self, name: &str) -> Result<Table> {
        let range = self
            .inner
            .worksheet_range(name)
            .with_context(|| format!("Failed to read sheet '{}' of {:?}", name, self.path))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(first) => first.iter().map(header_text).collect(),
            None => return Ok(Table::default()),
        };

        let mut table = Table::new(headers);
        for row in rows {
            table.push_row(row.iter().map(to_cell).collect());
        }

        debug!(
            "Read sheet '{}' from {:?}: {} rows",
            name,
            self.path,
            table.len()
        );
        Ok(table)
    }

    /// Reads every sheet whose name is not in `skip`, in workbook order.
    pub fn read_sheets_except(&mut self, skip: &[String]) -> Result<Vec<(String, Table)>> {
        let names: Vec<String> = self
            .sheet_names()
            .into_iter()
            .filter(|name| !skip.iter().any(|s| s == name))
            .collect();

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let table = self.read_sheet(&name)?;
            sheets.push((name, table));
        }
        Ok(sheets)
    }
}

fn header_text(data: &Data) -> String {
    to_cell(data).to_string().trim().to_string()
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::from(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

//! Spreadsheet I/O.
//!
//! Workbooks are read into loosely typed [`Table`]s (first row = headers) and
//! written back through [`WorkbookWriter`], which keeps every sheet in memory
//! and re-saves the whole file on [`WorkbookWriter::flush`]. Pipelines flush
//! after each finished group, so a crash only loses the group in progress.

mod cell;
mod reader;
mod writer;

pub use cell::{Cell, Table};
pub use reader::WorkbookReader;
pub use writer::{Sheet, WorkbookWriter};

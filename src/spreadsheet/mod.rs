//! Grid access layer: opens a workbook and hands out whole worksheets as [`Grid`]s.

mod cell;
pub(crate) mod excel;
mod grid;
mod memory;
pub mod reference;
pub(crate) mod xls;
pub(crate) mod xlsx;

pub use cell::Cell;
pub use cell::CellType;
pub use grid::Grid;
pub use memory::MemorySpreadsheet;

use crate::error::ChromaSheetError;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet format for '{0}' (expected .xls, .xlsx or .xlsm)")]
    UnsupportedFormat(String),

    #[error("Spreadsheet '{0}' is password protected")]
    PasswordProtected(String),

    #[error("Spreadsheet '{0}' contains no worksheets")]
    Empty(String),

    #[error("Worksheet '{sheet}' not found in '{file}'")]
    SheetNotFound { file: String, sheet: String },

    #[error("Missing part '{0}' in workbook")]
    MissingPart(String),
}

/// A source of worksheets.
pub trait Spreadsheet {
    /// File name (or label) used in messages.
    fn name(&self) -> String;

    /// Worksheet names in workbook order; the first one is the default sheet.
    fn sheet_names(&self) -> Vec<String>;

    /// Loads every cell of one worksheet.
    fn read_sheet(&mut self, name: &str) -> Result<Grid, ChromaSheetError>;
}

/// Opens a workbook file, choosing the container by extension.
pub fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, ChromaSheetError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" => Ok(Box::new(XlsxSpreadsheet::open(path)?)),
        "xls" => Ok(Box::new(XlsSpreadsheet::open(path)?)),
        _ => Err(SpreadsheetError::UnsupportedFormat(path.display().to_string()))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extensions_are_rejected() {
        let error = open_spreadsheet(Path::new("study.ods")).err().map(|error| error.to_string());
        assert_eq!(
            error.as_deref(),
            Some("Unsupported spreadsheet format for 'study.ods' (expected .xls, .xlsx or .xlsm)")
        );
    }
}

use crate::error::ChromaSheetError;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;

/// Worksheets held in memory, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemorySpreadsheet {
    name: String,
    sheets: Vec<Grid>,
}

impl MemorySpreadsheet {
    pub fn new(name: impl Into<String>) -> Self {
        MemorySpreadsheet { name: name.into(), sheets: Vec::new() }
    }

    /// Adds a worksheet; the grid's own name is the sheet name.
    pub fn with_sheet(mut self, grid: Grid) -> Self {
        self.sheets.push(grid);
        self
    }
}

impl Spreadsheet for MemorySpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|grid| grid.name().to_owned()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Grid, ChromaSheetError> {
        self.sheets
            .iter()
            .find(|grid| grid.name() == name)
            .cloned()
            .ok_or_else(|| {
                SpreadsheetError::SheetNotFound { file: self.name.to_owned(), sheet: name.to_owned() }.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_keep_insertion_order() {
        let mut spreadsheet = MemorySpreadsheet::new("study.xlsx")
            .with_sheet(Grid::from_rows("Input", &[["a"]]))
            .with_sheet(Grid::from_rows("Fractions", &[["b"]]));

        assert_eq!(spreadsheet.sheet_names(), vec!["Input", "Fractions"]);
        assert_eq!(spreadsheet.read_sheet("Fractions").unwrap().text(0, 0), "b");
        let error = spreadsheet.read_sheet("Missing").unwrap_err().to_string();
        assert_eq!(error, "Worksheet 'Missing' not found in 'study.xlsx'");
    }
}

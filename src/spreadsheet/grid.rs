use crate::error::ChromaSheetError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::index_to_reference;
use crate::template::ExtractError;
use std::collections::HashMap;

/// A fully loaded worksheet addressed by 0-based `(row, col)`.
///
/// Reads outside the populated area behave like blank cells, so scans over
/// rows or columns always terminate at the first gap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    name: String,
    cells: HashMap<(usize, usize), Cell>,
    row_count: usize,
    column_count: usize,
}

impl Grid {
    pub fn new(name: impl Into<String>) -> Self {
        Grid { name: name.into(), ..Default::default() }
    }

    /// Builds a grid from text rows. Literals that parse as numbers become
    /// numeric cells, empty strings leave the cell blank.
    pub fn from_rows<R: AsRef<[&'static str]>>(name: impl Into<String>, rows: &[R]) -> Self {
        let mut grid = Grid::new(name);
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.as_ref().iter().enumerate() {
                let kind = if value.trim().parse::<f64>().is_ok() { CellType::Number } else { CellType::Text };
                grid.push(Cell::new(row, col, kind, *value));
            }
        }
        grid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a cell, replacing whatever was at its position. Blank cells are dropped.
    pub fn push(&mut self, cell: Cell) {
        if cell.kind == CellType::Empty || cell.value.is_empty() {
            return;
        }
        self.row_count = self.row_count.max(cell.row + 1);
        self.column_count = self.column_count.max(cell.col + 1);
        self.cells.insert((cell.row, cell.col), cell);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Displayed text of a cell; blank and out-of-range cells read as "".
    pub fn text(&self, row: usize, col: usize) -> String {
        self.get(row, col).map(Cell::to_string).unwrap_or_default()
    }

    pub fn number(&self, row: usize, col: usize) -> Result<f64, ChromaSheetError> {
        match self.get(row, col).and_then(Cell::to_number) {
            Some(number) => Ok(number),
            None => Err(ExtractError::InvalidNumber {
                reference: index_to_reference(row, col),
                value: self.text(row, col),
            })?,
        }
    }

    /// Integer reading truncates the numeric value toward zero.
    pub fn integer(&self, row: usize, col: usize) -> Result<i64, ChromaSheetError> {
        Ok(self.number(row, col)?.trunc() as i64)
    }

    /// Last populated row + 1.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row(&self, row: usize) -> Vec<String> {
        (0..self.column_count).map(|col| self.text(row, col)).collect()
    }

    pub fn column(&self, col: usize) -> Vec<String> {
        (0..self.row_count).map(|row| self.text(row, col)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

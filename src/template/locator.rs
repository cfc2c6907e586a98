//! Finds section and subsection anchors by scanning the label columns.

use crate::spreadsheet::Grid;
use crate::template::LocateError;
use crate::template::CONTENT_NAME_COL;
use crate::template::FIRST_CONTENT_COL;
use crate::template::SECTION_HEADER_COL;

/// Row of the first section header that starts with `header`, after trimming.
pub fn find_section(grid: &Grid, header: &str) -> Result<usize, LocateError> {
    let mut found = Vec::new();
    for row in 0..grid.row_count() {
        let entry = grid.text(row, SECTION_HEADER_COL);
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if entry.starts_with(header) {
            return Ok(row);
        }
        found.push(entry.to_owned());
    }
    Err(LocateError::SectionNotFound { header: header.to_owned(), found })
}

/// Row in `[from, until)` whose label matches `header` ignoring case and
/// padding. `until` defaults to the end of the sheet; an empty `header`
/// finds the first blank label.
pub fn find_subsection(grid: &Grid, header: &str, from: usize, until: Option<usize>) -> Result<usize, LocateError> {
    let until = until.unwrap_or_else(|| grid.row_count());
    let wanted = header.trim().to_lowercase();
    (from..until)
        .find(|row| grid.text(*row, CONTENT_NAME_COL).trim().to_lowercase() == wanted)
        .ok_or_else(|| LocateError::SubsectionNotFound { header: header.to_owned(), from, until })
}

/// Exclusive end of the instance columns of a section, judged by the row
/// below its header.
pub fn section_width(grid: &Grid, section_start: usize) -> usize {
    let mut col = FIRST_CONTENT_COL;
    while !grid.text(section_start + 1, col).is_empty() {
        col += 1;
    }
    col
}

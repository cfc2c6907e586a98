//! Method step scanner.
//!
//! A step starts at its `Step {i} Name` marker and runs down the label column
//! until the next step's marker or a blank label. Rows in between are
//! classified by their label; unknown labels are skipped.

use crate::error::ChromaSheetError;
use crate::spreadsheet::Grid;
use crate::template::is_missing;
use crate::template::locator::find_subsection;
use crate::template::records::StepRecord;
use crate::template::ExtractError;
use crate::template::LocateError;
use crate::template::CONTENT_NAME_COL;

fn step_marker(step: usize) -> String {
    format!("Step {step} Name")
}

/// Reads step `step` (1-based) of the experiment in `col`.
pub fn read_step(grid: &Grid, step: usize, col: usize) -> Result<StepRecord, ChromaSheetError> {
    let start = match find_subsection(grid, &step_marker(step), 0, None) {
        Ok(row) => row,
        Err(_) => Err(LocateError::StepNotFound { step })?,
    };
    let next_marker = step_marker(step + 1).to_lowercase();

    let mut record = StepRecord { name: grid.text(start, col), ..Default::default() };
    // out-of-range labels read blank, so the scan always stops
    for row in start.. {
        let label = grid.text(row, CONTENT_NAME_COL).trim().to_lowercase();
        match label.as_str() {
            "buffer name" | "load name" => {
                let value = grid.text(row, col);
                if !is_missing(&value) {
                    record.solution_names.push(value);
                }
            }
            "step type" => record.step_type = Some(grid.text(row, col)),
            "step volume" => record.volume = Some(grid.number(row, col)?),
            "step flow rate" => record.flow_rate = Some(grid.number(row, col)?),
            "" => break,
            label if label == next_marker => break,
            _ => {}
        }
    }
    log::debug!("Read step {step} {:?} in column {col}", record.name);
    Ok(record)
}

/// Reads steps 1, 2, ... until a marker is missing.
pub fn read_all_steps(grid: &Grid, col: usize) -> Result<Vec<StepRecord>, ChromaSheetError> {
    let mut steps = Vec::new();
    loop {
        match read_step(grid, steps.len() + 1, col) {
            Ok(step) => steps.push(step),
            Err(ChromaSheetError::LocateError(LocateError::StepNotFound { .. })) => return Ok(steps),
            Err(error) => return Err(error),
        }
    }
}

/// 0-based position of the only step named `name`, ignoring case.
pub fn step_index(steps: &[StepRecord], name: &str) -> Result<usize, ExtractError> {
    let wanted = name.trim().to_lowercase();
    let matches: Vec<usize> = steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.name.trim().to_lowercase() == wanted)
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [index] => Ok(*index),
        _ => Err(ExtractError::AmbiguousStep { name: name.to_owned(), matches: matches.len() }),
    }
}

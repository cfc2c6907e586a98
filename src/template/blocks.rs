//! Readers for the variable-length blocks shared by both template versions.

use crate::error::ChromaSheetError;
use crate::schema::check_known_assay;
use crate::spreadsheet::Grid;
use crate::template::is_missing;
use crate::template::offsets::BufferOffsets;
use crate::template::records::AssayDict;
use crate::template::records::BufferChemical;
use crate::template::records::ChemicalState;
use crate::template::CONTENT_NAME_COL;
use std::collections::BTreeMap;

/// Reads `count` assay rows: the name from the label column, checked against
/// `known`, and the measured value from `col`.
pub(crate) fn read_assay_block(
    grid: &Grid,
    start_row: usize,
    count: usize,
    col: usize,
    known: &[String],
) -> Result<AssayDict, ChromaSheetError> {
    let mut assays = AssayDict::new();
    for row in start_row..start_row + count {
        let assay = grid.text(row, CONTENT_NAME_COL).trim().to_owned();
        check_known_assay(&assay, known)?;
        assays.insert(assay, grid.number(row, col)?);
    }
    Ok(assays)
}

/// Reads (name, concentration) row pairs while the label starts with
/// "component". Returns the concentrations and the first row past the block.
pub(crate) fn read_chemical_components(
    grid: &Grid,
    start_row: usize,
    col: usize,
) -> Result<(BTreeMap<String, f64>, usize), ChromaSheetError> {
    let mut components = BTreeMap::new();
    let mut row = start_row;
    while grid.text(row, CONTENT_NAME_COL).trim().to_lowercase().starts_with("component") {
        components.insert(grid.text(row, col), grid.number(row + 1, col)?);
        row += 2;
    }
    Ok((components, row))
}

/// Solid and liquid additions of one buffer column. Rows whose name is a
/// missing-value marker are skipped before their numbers are parsed.
pub(crate) fn read_buffer_chemicals(
    grid: &Grid,
    offsets: &BufferOffsets,
    col: usize,
) -> Result<BTreeMap<String, BufferChemical>, ChromaSheetError> {
    let mut chemicals = BTreeMap::new();

    for index in 0..offsets.solid_count() {
        let row = offsets.solid_start + index * 2;
        let name = grid.text(row, col).trim().to_owned();
        if is_missing(&name) {
            continue;
        }
        let chemical = BufferChemical {
            state: ChemicalState::Solid,
            concentration: 0.0,
            amount: grid.number(row + 1, col)?,
        };
        chemicals.insert(name, chemical);
    }

    for index in 0..offsets.liquid_count() {
        let row = offsets.liquid_start + index * 3;
        let name = grid.text(row, col).trim().to_owned();
        if is_missing(&name) {
            continue;
        }
        let chemical = BufferChemical {
            state: ChemicalState::Liquid,
            concentration: grid.number(row + 1, col)?,
            amount: grid.number(row + 2, col)?,
        };
        chemicals.insert(name, chemical);
    }

    Ok(chemicals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["Acidic_2".to_owned(), "Acidic_1".to_owned(), "Native".to_owned()]
    }

    #[test]
    fn assay_values_keep_their_names() {
        let grid = Grid::from_rows("Input", &[
            vec!["", "Acidic_2", "%", "8.4"],
            vec!["", "Acidic_1", "%", "88.2"],
            vec!["", "Native", "%", "3.6"],
        ]);
        let assays = read_assay_block(&grid, 0, 3, 3, &known()).unwrap();
        assert_eq!(assays.get("Acidic_2"), Some(&8.4));
        assert_eq!(assays.get("Acidic_1"), Some(&88.2));
        assert_eq!(assays.get("Native"), Some(&3.6));
    }

    #[test]
    fn unknown_assay_names_fail() {
        let grid = Grid::from_rows("Input", &[vec!["", "Basic_1", "%", "1"]]);
        let error = read_assay_block(&grid, 0, 1, 3, &known()).unwrap_err();
        assert!(error.is_lookup_error());
        assert!(error.to_string().contains("Basic_1"));
    }

    #[test]
    fn chemical_components_stop_at_other_labels() {
        let grid = Grid::from_rows("Input", &[
            vec!["", "Component 1 Name", "", "NaCl"],
            vec!["", "Component 1 Concentration", "mM", "50"],
            vec!["", "Component 2 Name", "", "Tris"],
            vec!["", "Component 2 Concentration", "mM", "20"],
            vec!["", "Density", "g/mL", "1.01"],
        ]);
        let (components, next_row) = read_chemical_components(&grid, 0, 3).unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components["NaCl"], 50.0);
        assert_eq!(components["Tris"], 20.0);
        assert_eq!(next_row, 4);
    }

    #[test]
    fn buffer_chemicals_skip_missing_names() {
        let grid = Grid::from_rows("Input", &[
            vec!["", "Solid 1 Name", "", " NaCl "],
            vec!["", "Solid 1 Amount", "g", "5"],
            vec!["", "Solid 2 Name", "", "NA"],
            vec!["", "Solid 2 Amount", "g", "N/A"],
            vec!["", "Liquid Additions"],
            vec!["", "Liquid 1 Name", "", "NaOH"],
            vec!["", "Liquid 1 Concentration", "M", "2"],
            vec!["", "Liquid 1 Amount", "mL", "3"],
        ]);
        let offsets = BufferOffsets { solid_start: 0, liquid_start: 5, liquid_end: 8 };
        let chemicals = read_buffer_chemicals(&grid, &offsets, 3).unwrap();

        assert_eq!(chemicals.len(), 2);
        assert_eq!(chemicals["NaCl"], BufferChemical { state: ChemicalState::Solid, concentration: 0.0, amount: 5.0 });
        assert_eq!(chemicals["NaOH"], BufferChemical { state: ChemicalState::Liquid, concentration: 2.0, amount: 3.0 });
    }
}

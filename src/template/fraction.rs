//! Fraction tables, each kept on its own worksheet named from the main sheet.

use crate::diagnostics::Diagnostics;
use crate::error::ChromaSheetError;
use crate::schema::validate_assays;
use crate::schema::ProductSchema;
use crate::spreadsheet::Grid;
use crate::template::locator::find_section;
use crate::template::records::FractionRecord;
use crate::template::records::Value;
use crate::template::FIRST_CONTENT_COL;
use crate::template::FRACTION_HEADER;

/// Name of the fraction worksheet of the experiment in `col`, or `None`
/// when the "fractions analyzed" flag reads "no".
pub(crate) fn fraction_sheet_name(sheet: &Grid, section_start: usize, col: usize) -> Option<String> {
    if sheet.text(section_start + 1, col).trim().eq_ignore_ascii_case("no") {
        return None;
    }
    Some(sheet.text(section_start + 2, col))
}

/// Reads every timed row below the "Fraction Number" header.
///
/// Assay columns follow time and total concentration. Assays the product
/// defines but the sheet lacks are reported and read as 0.0; assays the
/// product does not define fail the read.
pub(crate) fn fraction_data(
    grid: &Grid,
    product: &ProductSchema,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<FractionRecord>, ChromaSheetError> {
    let start = find_section(grid, FRACTION_HEADER)?;

    let mut header = grid.row(start);
    if let Some(end) = header.iter().position(String::is_empty) {
        header.truncate(end);
    }
    let has_assays = header.len() > FIRST_CONTENT_COL;

    let mut assays = Vec::new();
    let mut missing = Vec::new();
    if has_assays {
        assays = header[FIRST_CONTENT_COL..].to_vec();
        missing = validate_assays(&product.product_component_assays, &assays, grid.name())?;
        if !missing.is_empty() {
            diagnostics.info(format!(
                "Fraction data tab {:?} is missing assays {missing:?}; they are assumed to contribute nothing",
                grid.name()
            ));
        }
    }

    let mut fractions = Vec::new();
    for row in start + 2..grid.row_count() {
        if grid.text(row, 1).trim().is_empty() {
            continue;
        }
        let mut fraction = FractionRecord {
            time: Value::from_cell(grid.get(row, 1)),
            total_concentration: Value::from_cell(grid.get(row, 2)),
            product_component_assay_dict: Default::default(),
        };
        for (offset, assay) in assays.iter().enumerate() {
            let value = grid.number(row, FIRST_CONTENT_COL + offset)?;
            fraction.product_component_assay_dict.insert(assay.to_owned(), value);
        }
        for assay in &missing {
            fraction.product_component_assay_dict.insert(assay.to_owned(), 0.0);
        }
        fractions.push(fraction);
    }
    log::debug!("Read {} fractions from {:?}", fractions.len(), grid.name());
    Ok(fractions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductSchema {
        ProductSchema::new("Prod001", ["Acidic_2", "Acidic_1", "Native"], [])
    }

    #[test]
    fn flag_skips_the_worksheet() {
        let sheet = Grid::from_rows("Input", &[
            vec!["Fraction Data"],
            vec!["", "Fractions analyzed?", "", "No ", "yes"],
            vec!["", "Fraction sheet", "", "", "Run 2 Fractions"],
        ]);
        assert_eq!(fraction_sheet_name(&sheet, 0, 3), None);
        assert_eq!(fraction_sheet_name(&sheet, 0, 4), Some("Run 2 Fractions".to_owned()));
    }

    #[test]
    fn missing_assays_read_as_zero() {
        let grid = Grid::from_rows("Run 1 Fractions", &[
            vec!["Fraction Number", "Time", "Total", "Acidic_2", "Native"],
            vec!["", "min", "g/L", "%", "%"],
            vec!["1", "10.5", "0.8", "20", "80"],
            vec!["2", "", "", "", ""],
            vec!["3", "12.5", "1.2", "30", "70"],
        ]);
        let mut diagnostics = Diagnostics::default();
        let fractions = fraction_data(&grid, &product(), &mut diagnostics).unwrap();

        assert_eq!(fractions.len(), 2);
        assert_eq!(fractions[0].time, Value::Number(10.5));
        assert_eq!(fractions[1].total_concentration, Value::Number(1.2));
        for fraction in &fractions {
            assert_eq!(fraction.product_component_assay_dict["Acidic_1"], 0.0);
        }
        assert_eq!(fractions[1].product_component_assay_dict["Native"], 70.0);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn extra_assays_fail_by_name() {
        let grid = Grid::from_rows("Run 1 Fractions", &[
            vec!["Fraction Number", "Time", "Total", "Acidic_2", "Basic_9"],
            vec![""],
            vec!["1", "10.5", "0.8", "20", "80"],
        ]);
        let error = fraction_data(&grid, &product(), &mut Diagnostics::default()).unwrap_err();
        assert!(error.is_lookup_error());
        assert!(error.to_string().contains("Basic_9"));
    }

    #[test]
    fn assays_past_the_product_count_are_still_checked() {
        let product = ProductSchema::new("Prod003", ["A", "B", "C"], []);
        let grid = Grid::from_rows("Run 1 Fractions", &[
            vec!["Fraction Number", "Time", "Total", "A", "B", "C", "X"],
            vec![""],
            vec!["1", "10.5", "0.8", "20", "70", "5", "5"],
        ]);
        let error = fraction_data(&grid, &product, &mut Diagnostics::default()).unwrap_err();
        assert!(error.is_lookup_error());
        assert!(error.to_string().contains("\"X\""), "{error}");
    }

    #[test]
    fn tables_without_assays_have_empty_dicts() {
        let grid = Grid::from_rows("Run 1 Fractions", &[
            vec!["Fraction Number", "Time", "Total"],
            vec![""],
            vec!["1", "10.5", "0.8"],
        ]);
        let fractions = fraction_data(&grid, &product(), &mut Diagnostics::default()).unwrap();
        assert_eq!(fractions.len(), 1);
        assert!(fractions[0].product_component_assay_dict.is_empty());
    }
}

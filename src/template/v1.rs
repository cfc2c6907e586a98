//! First template revision, kept readable for older study files.
//!
//! Differs from the current revision mostly in where blocks sit: assay rows
//! start at a fixed distance, physical properties trail the chemical blocks,
//! and the method section declares its step count up front.

use crate::error::ChromaSheetError;
use crate::spreadsheet::Grid;
use crate::template::blocks::read_assay_block;
use crate::template::blocks::read_buffer_chemicals;
use crate::template::blocks::read_chemical_components;
use crate::template::insert_named;
use crate::template::layout::read_continuous_cells;
use crate::template::layout::Label;
use crate::template::locator::find_section;
use crate::template::locator::find_subsection;
use crate::template::locator::section_width;
use crate::template::offsets::AssayCounts;
use crate::template::offsets::BufferOffsets;
use crate::template::offsets::LoadOffsets;
use crate::template::offsets::PerformanceOffsets;
use crate::template::offsets::V1_BUFFER_PROPERTIES_OFFSET;
use crate::template::records::BufferRecord;
use crate::template::records::LoadRecord;
use crate::template::records::MethodRecord;
use crate::template::records::PerformanceRecord;
use crate::template::records::Record;
use crate::template::steps::read_step;
use crate::template::Context;
use crate::template::FIRST_CONTENT_COL;
use crate::template::UNSET;
use std::collections::BTreeMap;

/// Rows taken by one step in the method section.
const STEP_ROWS: i64 = 5;
/// Rows between the method header and the first step.
const STEP_BLOCK_OFFSET: usize = 5;

pub(super) fn load_data(context: &mut Context) -> Result<BTreeMap<String, LoadRecord>, ChromaSheetError> {
    let sheet = context.sheet;
    let product = context.product;
    let layout = context.layout;

    let section_start = find_section(sheet, layout.load_section)?;
    let counts = AssayCounts::all(product);
    let offsets = LoadOffsets::v1(section_start, counts);

    let mut loads = BTreeMap::new();
    for col in FIRST_CONTENT_COL..section_width(sheet, section_start) {
        log::debug!("Reading load in column {col}");
        let mut fields = read_continuous_cells(layout.load_labels, offsets.metadata, col, sheet)?;
        fields.insert("solution_type", "Load");

        let product_component_assay_dict = read_assay_block(
            sheet,
            offsets.component_assays,
            counts.components,
            col,
            &product.product_component_assays,
        )?;
        let impurity_assay_dict =
            read_assay_block(sheet, offsets.impurity_assays, counts.impurities, col, &product.impurity_assays)?;
        let (chemical_component_concentration_dict, properties_row) =
            read_chemical_components(sheet, offsets.chemical_components, col)?;
        fields.extend(read_continuous_cells(layout.load_property_labels, properties_row, col, sheet)?);

        let load = LoadRecord {
            fields,
            product_component_assay_dict,
            impurity_assay_dict,
            chemical_component_concentration_dict,
        };
        let name = load.fields.text("name").unwrap_or_default().to_owned();
        insert_named(&mut loads, name, load, "load", context.diagnostics);
    }
    Ok(loads)
}

pub(super) fn buffer_prep_data(context: &mut Context) -> Result<BTreeMap<String, BufferRecord>, ChromaSheetError> {
    let sheet = context.sheet;
    let layout = context.layout;
    let section_start = find_section(sheet, layout.buffer_section)?;
    let offsets = BufferOffsets::v1(sheet, section_start)?;

    let mut buffers = BTreeMap::new();
    for col in FIRST_CONTENT_COL..section_width(sheet, section_start) {
        log::debug!("Reading buffer in column {col}");
        let mut fields = read_continuous_cells(layout.buffer_labels, section_start + 1, col, sheet)?;
        let chemical_dict = read_buffer_chemicals(sheet, &offsets, col)?;
        fields.extend(read_continuous_cells(
            layout.buffer_property_labels,
            section_start + V1_BUFFER_PROPERTIES_OFFSET,
            col,
            sheet,
        )?);

        let buffer = BufferRecord { fields, chemical_dict };
        let name = buffer.fields.text("name").unwrap_or_default().to_owned();
        insert_named(&mut buffers, name, buffer, "buffer", context.diagnostics);
    }
    Ok(buffers)
}

pub(super) fn method_data(context: &mut Context, section_start: usize, col: usize) -> Result<MethodRecord, ChromaSheetError> {
    let sheet = context.sheet;
    let fields = read_continuous_cells(context.layout.method_labels, section_start + 1, col, sheet)?;

    let step_count = fields.integer("num_steps").unwrap_or_default().max(0) as usize;
    let steps = (1..=step_count).map(|step| read_step(sheet, step, col)).collect::<Result<Vec<_>, _>>()?;

    let (collection_criteria, collection_step_number) =
        match collection_criteria(sheet, context.layout.collection_criteria_labels, section_start, col) {
            Ok(found) => found,
            Err(error) => {
                context.diagnostics.warn(format!(
                    "Failed to collect collection criteria: error was {error}. Continuing with the rest of the file."
                ));
                (Record::new(), UNSET)
            }
        };

    Ok(MethodRecord { fields, steps, collection_criteria, collection_step_number })
}

/// The criteria block sits right after the step it applies to, so the step
/// number falls out of its distance to the first step.
fn collection_criteria(
    sheet: &Grid,
    labels: &[Label],
    section_start: usize,
    col: usize,
) -> Result<(Record, i64), ChromaSheetError> {
    let criteria_start = find_subsection(sheet, "Start Collect Type", section_start, None)?;
    let criteria = read_continuous_cells(labels, criteria_start, col, sheet)?;

    let distance = criteria_start as i64 - 1 - (section_start + STEP_BLOCK_OFFSET) as i64;
    let step_number = distance.div_euclid(STEP_ROWS);
    Ok((criteria, step_number - 1))
}

pub(super) fn performance_data(
    context: &mut Context,
    section_start: usize,
    col: usize,
) -> Result<PerformanceRecord, ChromaSheetError> {
    let sheet = context.sheet;
    let product = context.product;
    let layout = context.layout;

    let counts = AssayCounts::all(product);
    let offsets = PerformanceOffsets::v1(sheet, section_start, counts)?;

    let mut fields = read_continuous_cells(layout.performance_labels, offsets.metadata, col, sheet)?;
    let product_component_assay_dict = read_assay_block(
        sheet,
        offsets.component_assays,
        counts.components,
        col,
        &product.product_component_assays,
    )?;
    let impurity_assay_dict =
        read_assay_block(sheet, offsets.impurity_assays, counts.impurities, col, &product.impurity_assays)?;
    if let Some(row) = offsets.final_parameters {
        fields.extend(read_continuous_cells(layout.performance_final_labels, row, col, sheet)?);
    }

    Ok(PerformanceRecord { fields, product_component_assay_dict, impurity_assay_dict })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::schema::ProductSchema;
    use crate::template::layout::Layout;

    fn product() -> ProductSchema {
        ProductSchema::new("Prod001", ["Acidic_1", "Native"], ["HCP"])
    }

    #[test]
    fn load_properties_follow_the_components() {
        let sheet = Grid::from_rows("Input", &[
            vec!["Load Information"],
            vec!["", "Load Name", "", "Load A"],
            vec!["", "Source", "", "Lab"],
            vec!["", "Lot ID", "", "L1"],
            vec!["", "Concentration", "g/L", "4.5"],
            vec!["", "Acidic_1", "%", "90"],
            vec!["", "Native", "%", "10"],
            vec!["", "HCP", "ppm", "100"],
            vec!["", "Component 1 Name", "", "NaCl"],
            vec!["", "Component 1 Concentration", "mM", "50"],
            vec!["", "Density", "g/mL", "1.01"],
            vec!["", "Conductivity", "mS/cm", "12"],
            vec!["", "pH", "", "7"],
            vec!["", "Temperature", "C", "20"],
        ]);
        let product = product();
        let mut diagnostics = Diagnostics::default();
        let mut context = Context { sheet: &sheet, product: &product, layout: &Layout::V1, diagnostics: &mut diagnostics };

        let loads = load_data(&mut context).unwrap();
        let load = &loads["Load A"];
        assert_eq!(load.fields.number("product_concentration"), Some(4.5));
        assert_eq!(load.product_component_assay_dict["Native"], 10.0);
        assert_eq!(load.chemical_component_concentration_dict["NaCl"], 50.0);
        assert_eq!(load.fields.number("density"), Some(1.01));
        assert_eq!(load.fields.number("temperature"), Some(20.0));
    }

    fn method_sheet() -> Grid {
        Grid::from_rows("Input", &[
            vec!["Method Information"],
            vec!["", "Experiment Name", "", "Run 1"],
            vec!["", "Experiment Number", "", "1"],
            vec!["", "Run Type", "", "Gradient"],
            vec!["", "Number of Steps", "", "2"],
            vec![""],
            vec!["", "Step 1 Name", "", "Load"],
            vec!["", "Step Type", "", "Load"],
            vec!["", "Step Volume", "CV", "10"],
            vec!["", "Step Flow Rate", "cm/hr", "100"],
            vec!["", "Step 2 Name", "", "Elution"],
            vec!["", "Step Type", "", "Gradient Elution"],
            vec!["", "Step Volume", "CV", "20"],
            vec!["", "Step Flow Rate", "cm/hr", "100"],
            vec!["", "Load Name", "", "NA"],
            vec!["", "Start Collect Type", "", "UV"],
            vec!["", "Start Collect Target", "mAU", "100"],
            vec!["", "Stop Collect Type", "", "UV"],
            vec!["", "Stop Collect Target", "mAU", "50"],
        ])
    }

    #[test]
    fn declared_steps_and_collection_distance() {
        let sheet = method_sheet();
        let product = product();
        let mut diagnostics = Diagnostics::default();
        let mut context = Context { sheet: &sheet, product: &product, layout: &Layout::V1, diagnostics: &mut diagnostics };

        let method = method_data(&mut context, 0, 3).unwrap();
        assert_eq!(method.fields.integer("experiment_number"), Some(1));
        assert_eq!(method.steps.len(), 2);
        assert_eq!(method.steps[1].volume, Some(20.0));
        assert_eq!(method.collection_criteria.text("stop_collection_type"), Some("UV"));
        assert_eq!(method.collection_step_number, 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_criteria_are_downgraded_to_a_warning() {
        let sheet = Grid::from_rows("Input", &[
            vec!["Method Information"],
            vec!["", "Experiment Name", "", "Run 1"],
            vec!["", "Experiment Number", "", "1"],
            vec!["", "Run Type", "", "Gradient"],
            vec!["", "Number of Steps", "", "0"],
        ]);
        let product = product();
        let mut diagnostics = Diagnostics::default();
        let mut context = Context { sheet: &sheet, product: &product, layout: &Layout::V1, diagnostics: &mut diagnostics };

        let method = method_data(&mut context, 0, 3).unwrap();
        assert!(method.steps.is_empty());
        assert!(method.collection_criteria.is_empty());
        assert_eq!(method.collection_step_number, UNSET);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn performance_reads_trailing_parameters() {
        let sheet = Grid::from_rows("Input", &[
            vec!["Performance Parameters"],
            vec!["", "Pool Volume", "CV", "3"],
            vec!["", "Step Yield", "%", "85"],
            vec!["", "Pool Concentration", "g/L", "2.5"],
            vec!["", "Acidic_1", "%", "95"],
            vec!["", "Native", "%", "5"],
            vec!["", "HCP", "ppm", "10"],
            vec!["", "Conductivity", "mS/cm", "20"],
            vec!["", "pH", "", "5.5"],
            vec!["Fraction Data"],
        ]);
        let product = product();
        let mut diagnostics = Diagnostics::default();
        let mut context = Context { sheet: &sheet, product: &product, layout: &Layout::V1, diagnostics: &mut diagnostics };

        let performance = performance_data(&mut context, 0, 3).unwrap();
        assert_eq!(performance.fields.number("pool_volume"), Some(3.0));
        assert_eq!(performance.fields.number("conductivity"), Some(20.0));
        assert_eq!(performance.fields.number("pH"), Some(5.5));
        assert_eq!(performance.product_component_assay_dict["Acidic_1"], 95.0);
    }
}

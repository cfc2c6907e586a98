//! Current template revision.

use crate::error::ChromaSheetError;
use crate::template::blocks::read_assay_block;
use crate::template::blocks::read_buffer_chemicals;
use crate::template::blocks::read_chemical_components;
use crate::template::insert_named;
use crate::template::layout::read_continuous_cells;
use crate::template::layout::COLLECTION_STEP_LABEL;
use crate::template::locator::find_section;
use crate::template::locator::section_width;
use crate::template::offsets::AssayCounts;
use crate::template::offsets::BufferOffsets;
use crate::template::offsets::LoadOffsets;
use crate::template::offsets::PerformanceOffsets;
use crate::template::records::BufferRecord;
use crate::template::records::LoadRecord;
use crate::template::records::MethodRecord;
use crate::template::records::PerformanceRecord;
use crate::template::records::Record;
use crate::template::steps::read_all_steps;
use crate::template::steps::step_index;
use crate::template::Context;
use crate::template::FIRST_CONTENT_COL;
use crate::template::UNSET;
use std::collections::BTreeMap;

fn skipped(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("no")
}

pub(super) fn load_data(context: &mut Context) -> Result<BTreeMap<String, LoadRecord>, ChromaSheetError> {
    let sheet = context.sheet;
    let product = context.product;
    let labels = context.layout.load_labels;

    let section_start = find_section(sheet, context.layout.load_section)?;
    let counts = AssayCounts::without_strip(product);
    let offsets = LoadOffsets::v2(section_start, labels.len(), counts);

    let mut loads = BTreeMap::new();
    for col in FIRST_CONTENT_COL..section_width(sheet, section_start) {
        log::debug!("Reading load in column {col}");
        let mut fields = read_continuous_cells(labels, offsets.metadata, col, sheet)?;
        fields.insert("solution_type", "Load");

        let (chemical_component_concentration_dict, _) =
            read_chemical_components(sheet, offsets.chemical_components, col)?;
        let load = LoadRecord {
            product_component_assay_dict: read_assay_block(
                sheet,
                offsets.component_assays,
                counts.components,
                col,
                &product.product_component_assays,
            )?,
            impurity_assay_dict: read_assay_block(
                sheet,
                offsets.impurity_assays,
                counts.impurities,
                col,
                &product.impurity_assays,
            )?,
            chemical_component_concentration_dict,
            fields,
        };
        let name = load.fields.text("name").unwrap_or_default().to_owned();
        insert_named(&mut loads, name, load, "load", context.diagnostics);
    }
    Ok(loads)
}

pub(super) fn buffer_prep_data(context: &mut Context) -> Result<BTreeMap<String, BufferRecord>, ChromaSheetError> {
    let sheet = context.sheet;
    let section_start = find_section(sheet, context.layout.buffer_section)?;
    let offsets = BufferOffsets::v2(sheet, section_start)?;

    let mut buffers = BTreeMap::new();
    for col in FIRST_CONTENT_COL..section_width(sheet, section_start) {
        log::debug!("Reading buffer in column {col}");
        let buffer = BufferRecord {
            fields: read_continuous_cells(context.layout.buffer_labels, section_start + 1, col, sheet)?,
            chemical_dict: read_buffer_chemicals(sheet, &offsets, col)?,
        };
        let name = buffer.fields.text("name").unwrap_or_default().to_owned();
        insert_named(&mut buffers, name, buffer, "buffer", context.diagnostics);
    }
    Ok(buffers)
}

pub(super) fn method_data(context: &mut Context, section_start: usize, col: usize) -> Result<MethodRecord, ChromaSheetError> {
    let sheet = context.sheet;
    let fields = read_continuous_cells(context.layout.method_labels, section_start + 1, col, sheet)?;
    let steps = read_all_steps(sheet, col)?;

    let criteria_start = find_section(sheet, context.layout.collection_criteria_section)?;
    let (collection_criteria, collection_step_number) = if skipped(&sheet.text(criteria_start + 1, col)) {
        log::debug!("No collection criteria for the experiment in column {col}");
        (Record::new(), UNSET)
    } else {
        let mut criteria =
            read_continuous_cells(context.layout.collection_criteria_labels, criteria_start + 2, col, sheet)?;
        let step_name = criteria
            .remove(COLLECTION_STEP_LABEL)
            .and_then(|value| value.as_text().map(str::to_owned))
            .unwrap_or_default();
        let index = step_index(&steps, &step_name)?;
        (criteria, index as i64)
    };

    Ok(MethodRecord { fields, steps, collection_criteria, collection_step_number })
}

pub(super) fn performance_data(
    context: &mut Context,
    section_start: usize,
    col: usize,
) -> Result<Option<PerformanceRecord>, ChromaSheetError> {
    let sheet = context.sheet;
    if skipped(&sheet.text(section_start + 1, col)) {
        log::debug!("No performance parameters for the experiment in column {col}");
        return Ok(None);
    }

    let product = context.product;
    let counts = AssayCounts::without_strip(product);
    let offsets = PerformanceOffsets::v2(section_start, counts);
    Ok(Some(PerformanceRecord {
        fields: read_continuous_cells(context.layout.performance_labels, offsets.metadata, col, sheet)?,
        product_component_assay_dict: read_assay_block(
            sheet,
            offsets.component_assays,
            counts.components,
            col,
            &product.product_component_assays,
        )?,
        impurity_assay_dict: read_assay_block(sheet, offsets.impurity_assays, counts.impurities, col, &product.impurity_assays)?,
    }))
}

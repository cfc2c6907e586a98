//! Row arithmetic for the blocks inside a section.
//!
//! Most blocks sit at fixed distances from the section header; the variable
//! ones depend on how many assays the product defines or on anchors found by
//! scanning. Within one section the computed block rows never decrease.

use crate::schema::ProductSchema;
use crate::spreadsheet::Grid;
use crate::template::locator::find_subsection;
use crate::template::LocateError;
use crate::template::CONTENT_NAME_COL;
use crate::template::SECTION_HEADER_COL;

/// Fixed row of the V1 buffer physical properties below the section header.
pub const V1_BUFFER_PROPERTIES_OFFSET: usize = 17;

/// How many assay rows each block holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AssayCounts {
    pub components: usize,
    pub impurities: usize,
}

impl AssayCounts {
    /// All product component assays.
    pub fn all(product: &ProductSchema) -> Self {
        AssayCounts {
            components: product.product_component_assays.len(),
            impurities: product.impurity_assays.len(),
        }
    }

    /// The strip assay has no row of its own in the newer template.
    pub fn without_strip(product: &ProductSchema) -> Self {
        AssayCounts {
            components: product.assay_count_without_strip(),
            impurities: product.impurity_assays.len(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadOffsets {
    pub metadata: usize,
    pub component_assays: usize,
    pub impurity_assays: usize,
    pub chemical_components: usize,
}

impl LoadOffsets {
    /// Metadata is followed by a blank row and the assay block header.
    pub fn v2(section_start: usize, label_count: usize, counts: AssayCounts) -> Self {
        let component_assays = section_start + label_count + 2;
        let impurity_assays = component_assays + counts.components;
        LoadOffsets {
            metadata: section_start + 1,
            component_assays,
            impurity_assays,
            chemical_components: impurity_assays + counts.impurities + 1,
        }
    }

    pub fn v1(section_start: usize, counts: AssayCounts) -> Self {
        let component_assays = section_start + 5;
        let impurity_assays = component_assays + counts.components;
        LoadOffsets {
            metadata: section_start + 1,
            component_assays,
            impurity_assays,
            chemical_components: impurity_assays + counts.impurities,
        }
    }

    pub fn blocks(&self) -> [(&'static str, usize); 4] {
        [
            ("metadata", self.metadata),
            ("component_assays", self.component_assays),
            ("impurity_assays", self.impurity_assays),
            ("chemical_components", self.chemical_components),
        ]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PerformanceOffsets {
    pub metadata: usize,
    pub component_assays: usize,
    pub impurity_assays: usize,
    /// Conductivity / pH rows, V1 only
    pub final_parameters: Option<usize>,
}

impl PerformanceOffsets {
    /// Row `section_start + 1` holds the "collected?" flag.
    pub fn v2(section_start: usize, counts: AssayCounts) -> Self {
        let component_assays = section_start + 8;
        PerformanceOffsets {
            metadata: section_start + 2,
            component_assays,
            impurity_assays: component_assays + counts.components,
            final_parameters: None,
        }
    }

    pub fn v1(grid: &Grid, section_start: usize, counts: AssayCounts) -> Result<Self, LocateError> {
        let component_assays = section_start + 4;
        Ok(PerformanceOffsets {
            metadata: section_start + 1,
            component_assays,
            impurity_assays: component_assays + counts.components,
            final_parameters: Some(conductivity_row(grid, component_assays)?),
        })
    }

    pub fn blocks(&self) -> Vec<(&'static str, usize)> {
        let mut blocks = vec![
            ("metadata", self.metadata),
            ("component_assays", self.component_assays),
            ("impurity_assays", self.impurity_assays),
        ];
        if let Some(row) = self.final_parameters {
            blocks.push(("final_parameters", row));
        }
        blocks
    }
}

/// Scans down from `from` for the "conductivity" label, giving up at the
/// "Fraction Data" section or the end of the sheet.
pub fn conductivity_row(grid: &Grid, from: usize) -> Result<usize, LocateError> {
    let mut row = from;
    while row < grid.row_count() {
        if grid.text(row, SECTION_HEADER_COL).trim().to_lowercase() == "fraction data" {
            break;
        }
        if grid.text(row, CONTENT_NAME_COL).trim().to_lowercase() == "conductivity" {
            return Ok(row);
        }
        row += 1;
    }
    Err(LocateError::ScanExhausted { label: "conductivity".to_owned(), from, to: row })
}

/// Solid rows come in pairs (name, amount); liquid rows in triples
/// (name, concentration, amount).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferOffsets {
    pub solid_start: usize,
    pub liquid_start: usize,
    pub liquid_end: usize,
}

impl BufferOffsets {
    /// Liquids run until the first blank label.
    pub fn v2(grid: &Grid, section_start: usize) -> Result<Self, LocateError> {
        let solid_start = find_subsection(grid, "Solid Additions", section_start, None)? + 1;
        let liquid_start = find_subsection(grid, "Liquid Additions", section_start, None)? + 1;
        // a buffer block at the very bottom of the sheet has no trailing blank row
        let liquid_end = find_subsection(grid, "", liquid_start, None).unwrap_or(grid.row_count().max(liquid_start));
        Ok(BufferOffsets { solid_start, liquid_start, liquid_end })
    }

    /// Liquids run until the "Buffer Volume" row.
    pub fn v1(grid: &Grid, section_start: usize) -> Result<Self, LocateError> {
        let solid_start = find_subsection(grid, "Solid Additions", section_start, None)? + 1;
        let liquid_start = find_subsection(grid, "Liquid Additions", section_start, None)? + 1;
        let liquid_end = find_subsection(grid, "Buffer Volume", liquid_start, None)?;
        Ok(BufferOffsets { solid_start, liquid_start, liquid_end })
    }

    /// The liquid header row counts against the solids, hence the floor.
    pub fn solid_count(&self) -> usize {
        self.liquid_start.saturating_sub(self.solid_start) / 2
    }

    pub fn liquid_count(&self) -> usize {
        self.liquid_end.saturating_sub(self.liquid_start) / 3
    }
}

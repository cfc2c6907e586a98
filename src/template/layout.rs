//! Per-version template layout: section names and the row labels read from them.

use crate::error::ChromaSheetError;
use crate::spreadsheet::Grid;
use crate::template::records::Record;
use crate::template::records::Value;
use std::fmt::Debug;

/// Reads one cell into a field value.
pub type Transform = fn(&Grid, usize, usize) -> Result<Value, ChromaSheetError>;

/// A field read from consecutive rows of a section, one label per row.
#[derive(Clone, Copy)]
pub struct Label {
    pub name: &'static str,
    pub transform: Transform,
}

impl Label {
    /// Displayed text as-is.
    pub const fn text(name: &'static str) -> Self {
        Label { name, transform: read_text }
    }

    pub const fn trimmed(name: &'static str) -> Self {
        Label { name, transform: read_trimmed }
    }

    pub const fn float(name: &'static str) -> Self {
        Label { name, transform: read_float }
    }

    pub const fn integer(name: &'static str) -> Self {
        Label { name, transform: read_integer }
    }

    pub fn read(&self, grid: &Grid, row: usize, col: usize) -> Result<Value, ChromaSheetError> {
        (self.transform)(grid, row, col)
    }
}

impl Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Label").field(&self.name).finish()
    }
}

fn read_text(grid: &Grid, row: usize, col: usize) -> Result<Value, ChromaSheetError> {
    Ok(Value::Text(grid.text(row, col)))
}

fn read_trimmed(grid: &Grid, row: usize, col: usize) -> Result<Value, ChromaSheetError> {
    Ok(Value::Text(grid.text(row, col).trim().to_owned()))
}

fn read_float(grid: &Grid, row: usize, col: usize) -> Result<Value, ChromaSheetError> {
    grid.number(row, col).map(Value::Number)
}

fn read_integer(grid: &Grid, row: usize, col: usize) -> Result<Value, ChromaSheetError> {
    grid.integer(row, col).map(Value::Integer)
}

/// Reads `labels[i]` from row `start_row + i` of one instance column.
pub fn read_continuous_cells(labels: &[Label], start_row: usize, col: usize, grid: &Grid) -> Result<Record, ChromaSheetError> {
    let mut record = Record::new();
    for (offset, label) in labels.iter().enumerate() {
        record.insert(label.name, label.read(grid, start_row + offset, col)?);
    }
    Ok(record)
}

/// Everything that differs between template versions apart from row arithmetic.
#[derive(Debug)]
pub struct Layout {
    pub general_section: &'static str,
    pub system_section: &'static str,
    pub column_section: &'static str,
    pub load_section: &'static str,
    pub buffer_section: &'static str,
    pub method_section: &'static str,
    pub collection_criteria_section: &'static str,
    pub performance_section: &'static str,
    pub fraction_section: &'static str,
    pub continuous_section: &'static str,

    pub general_labels: &'static [Label],
    pub system_labels: &'static [Label],
    pub column_labels: &'static [Label],
    pub load_labels: &'static [Label],
    /// Read after the load chemical components (V1 only)
    pub load_property_labels: &'static [Label],
    pub buffer_labels: &'static [Label],
    /// Read at a fixed offset below the buffer header (V1 only)
    pub buffer_property_labels: &'static [Label],
    pub method_labels: &'static [Label],
    pub collection_criteria_labels: &'static [Label],
    pub performance_labels: &'static [Label],
    /// Located by scanning for the conductivity row (V1 only)
    pub performance_final_labels: &'static [Label],
}

/// Label of the collection criteria row naming the step to collect at.
pub const COLLECTION_STEP_LABEL: &str = "Collection step";

impl Layout {
    pub const V1: Layout = Layout {
        general_section: "General Experiment Information",
        system_section: "Chromatography System Information",
        column_section: "Chromatography Column Information",
        load_section: "Load Information",
        buffer_section: "Buffer Information",
        method_section: "Method Information",
        collection_criteria_section: "Collection criteria information",
        performance_section: "Performance Parameters",
        fraction_section: "Fraction Data",
        continuous_section: "Continuous Data",

        general_labels: &[
            Label::text("product_name"),
            Label::text("study_name"),
            Label::text("study_id"),
            Label::text("study_type"),
            Label::text("study_subtype"),
            Label::text("study_purpose"),
            Label::text("column_placement"),
            Label::text("site"),
            Label::text("experimentalist"),
        ],
        system_labels: &[
            Label::text("system_id"),
            Label::text("system_name"),
            Label::text("system_type"),
            Label::float("holdup_pump_to_loop"),
            Label::float("holdup_loop_to_col"),
            Label::float("holdup_col_to_detect"),
            Label::float("absorbance_detector_pathlength"),
        ],
        column_labels: &[
            Label::text("packed_column_lot_id"),
            Label::text("resin_type"),
            Label::text("resin_lot_id"),
            Label::float("resin_avg_bead_diameter"),
            Label::float("resin_ligand_density"),
            Label::text("column_model"),
            Label::text("column_description"),
            Label::float("column_packed_bed_height"),
            Label::float("compression_factor"),
            Label::float("HETP"),
            Label::float("asymmetry"),
        ],
        load_labels: &[
            Label::text("name"),
            Label::text("source"),
            Label::text("lot_id"),
            Label::float("product_concentration"),
        ],
        load_property_labels: &[
            Label::float("density"),
            Label::float("conductivity"),
            Label::float("pH"),
            Label::float("temperature"),
        ],
        buffer_labels: &[
            Label::text("name"),
            Label::text("source"),
            Label::text("description"),
            Label::text("lot_id"),
            Label::float("density"),
        ],
        buffer_property_labels: &[
            Label::float("volume"),
            Label::float("conductivity"),
            Label::float("pH"),
            Label::float("temperature"),
        ],
        method_labels: &[
            Label::text("experiment_name"),
            Label::integer("experiment_number"),
            Label::text("run_type"),
            Label::integer("num_steps"),
        ],
        collection_criteria_labels: &[
            Label::text("start_collection_type"),
            Label::float("start_collection_target"),
            Label::text("stop_collection_type"),
            Label::float("stop_collection_target"),
        ],
        performance_labels: &[
            Label::float("pool_volume"),
            Label::float("step_yield"),
            Label::float("pool_concentration"),
        ],
        performance_final_labels: &[Label::float("conductivity"), Label::float("pH")],
    };

    pub const V2: Layout = Layout {
        general_section: "General Study Information",
        system_section: "Chromatography System Information",
        column_section: "Chromatography Column Information",
        load_section: "Load Information",
        buffer_section: "Buffer Information",
        method_section: "Method Information",
        collection_criteria_section: "Collection criteria information",
        performance_section: "Performance Parameters",
        fraction_section: "Fraction Data",
        continuous_section: "Continuous Data",

        general_labels: &[
            Label::text("product_name"),
            Label::text("study_name"),
            Label::text("study_id"),
            Label::text("study_type"),
            Label::text("study_purpose"),
            Label::text("site"),
            Label::text("column_placement"),
            Label::text("experimentalist"),
        ],
        system_labels: &[
            Label::text("system_type"),
            Label::text("system_name"),
            Label::text("system_id"),
            Label::float("holdup_pump_to_loop"),
            Label::float("holdup_loop_to_col"),
            Label::float("holdup_col_to_detect"),
            Label::float("absorbance_detector_pathlength"),
        ],
        column_labels: &[
            Label::text("packed_column_lot_id"),
            Label::text("resin_type"),
            Label::text("resin_lot_id"),
            Label::text("column_model"),
            Label::text("column_description"),
            Label::float("column_packed_bed_height"),
            Label::float("compression_factor"),
            Label::float("HETP"),
            Label::float("asymmetry"),
        ],
        load_labels: &[
            Label::text("name"),
            Label::text("source"),
            Label::text("description"),
            Label::text("lot_id"),
            Label::float("product_concentration"),
            Label::float("density"),
            Label::float("conductivity"),
            Label::float("pH"),
            Label::float("temperature"),
        ],
        load_property_labels: &[],
        buffer_labels: &[
            Label::text("name"),
            Label::text("source"),
            Label::text("description"),
            Label::text("lot_id"),
            Label::float("volume"),
            Label::float("density"),
            Label::float("conductivity"),
            Label::float("pH"),
            Label::float("temperature"),
        ],
        buffer_property_labels: &[],
        method_labels: &[Label::text("experiment_name"), Label::text("run_type")],
        collection_criteria_labels: &[
            Label::text(COLLECTION_STEP_LABEL),
            Label::text("start_collection_type"),
            Label::float("start_collection_target"),
            Label::text("start_collection_while"),
            Label::text("stop_collection_type"),
            Label::float("stop_collection_target"),
            Label::text("stop_collection_while"),
        ],
        performance_labels: &[
            Label::float("pool_volume"),
            Label::float("step_yield"),
            Label::float("pool_concentration"),
            Label::float("conductivity"),
            Label::float("pH"),
        ],
        performance_final_labels: &[],
    };
}

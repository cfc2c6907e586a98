//! Extraction engine for the chromatography study input template.
//!
//! A template is one worksheet split into sections. Each section starts with a
//! header in column A; column B names subsections and row labels; column C
//! holds units; values start in column D, one column per instance (load,
//! buffer, experiment). Versions differ only in section names, label lists and
//! row offsets, which live in [`layout::Layout`] and [`offsets`].

pub(crate) mod blocks;
pub(crate) mod fraction;
pub mod layout;
pub mod locator;
pub mod offsets;
pub mod records;
pub mod steps;
mod v1;
mod v2;

use crate::diagnostics::Diagnostics;
use crate::error::ChromaSheetError;
use crate::schema::ProductSchema;
use crate::spreadsheet::Grid;
use crate::template::layout::Layout;
use crate::template::records::BufferRecord;
use crate::template::records::LoadRecord;
use crate::template::records::MethodRecord;
use crate::template::records::PerformanceRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use thiserror::Error;

/// Column holding section headers.
pub const SECTION_HEADER_COL: usize = 0;
/// Column holding subsection headers and row labels.
pub const CONTENT_NAME_COL: usize = 1;
/// First column holding instance values.
pub const FIRST_CONTENT_COL: usize = 3;
/// Cell holding the template version number.
pub const VERSION_CELL: &str = "E1";
/// Cell values that count as "not provided".
pub const MISSING_VALUES: [&str; 3] = ["", "NA", "N/A"];
/// Collection step number when no collection happens.
pub const UNSET: i64 = -1;
/// Header of the table inside a fraction worksheet.
pub const FRACTION_HEADER: &str = "Fraction Number";

pub fn is_missing(value: &str) -> bool {
    MISSING_VALUES.contains(&value.trim())
}

/// Failures to find an anchor in the grid.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to find the section {header:?}. Section headers found: {found:?}")]
    SectionNotFound { header: String, found: Vec<String> },

    #[error("Failed to find the subsection {header:?} between rows {from} and {until}")]
    SubsectionNotFound { header: String, from: usize, until: usize },

    #[error("Step {step} not found")]
    StepNotFound { step: usize },

    #[error("Failed to find the {label} in the performance parameter section of the input file: scanned from row {from} to row {to}")]
    ScanExhausted { label: String, from: usize, to: usize },
}

/// Failures to turn located cells into values.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid number '{value}' at {reference}")]
    InvalidNumber { reference: String, value: String },

    #[error("Collection indicated to be done at step {name:?} but found {matches} steps with that name instead of exactly 1")]
    AmbiguousStep { name: String, matches: usize },

    #[error("Unsupported Excel input version '{version}'; known versions are 1 and 2")]
    UnsupportedVersion { version: String },

    #[error("Input file path '{path}' does not exist")]
    InvalidFilePath { path: String },
}

/// Template revision, read from [`VERSION_CELL`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateVersion {
    /// Deprecated first revision
    V1,
    V2,
}

pub const CURRENT_VERSION: TemplateVersion = TemplateVersion::V2;

impl TemplateVersion {
    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    pub fn number(self) -> i64 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            Self::V1 => &Layout::V1,
            Self::V2 => &Layout::V2,
        }
    }

    pub(crate) fn load_data(self, context: &mut Context) -> Result<BTreeMap<String, LoadRecord>, ChromaSheetError> {
        match self {
            Self::V1 => v1::load_data(context),
            Self::V2 => v2::load_data(context),
        }
    }

    pub(crate) fn buffer_prep_data(self, context: &mut Context) -> Result<BTreeMap<String, BufferRecord>, ChromaSheetError> {
        match self {
            Self::V1 => v1::buffer_prep_data(context),
            Self::V2 => v2::buffer_prep_data(context),
        }
    }

    pub(crate) fn method_data(self, context: &mut Context, section_start: usize, col: usize) -> Result<MethodRecord, ChromaSheetError> {
        match self {
            Self::V1 => v1::method_data(context, section_start, col),
            Self::V2 => v2::method_data(context, section_start, col),
        }
    }

    pub(crate) fn performance_data(
        self,
        context: &mut Context,
        section_start: usize,
        col: usize,
    ) -> Result<Option<PerformanceRecord>, ChromaSheetError> {
        match self {
            Self::V1 => v1::performance_data(context, section_start, col).map(Some),
            Self::V2 => v2::performance_data(context, section_start, col),
        }
    }
}

impl Display for TemplateVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// What every extractor needs: the main sheet, the product it is checked
/// against, the version layout, and somewhere to report soft problems.
pub(crate) struct Context<'a> {
    pub(crate) sheet: &'a Grid,
    pub(crate) product: &'a ProductSchema,
    pub(crate) layout: &'static Layout,
    pub(crate) diagnostics: &'a mut Diagnostics,
}

/// Inserts an instance keyed by its name; a later column with the same name
/// replaces the earlier one.
pub(crate) fn insert_named<T>(
    records: &mut BTreeMap<String, T>,
    name: String,
    record: T,
    what: &str,
    diagnostics: &mut Diagnostics,
) {
    if records.insert(name.to_owned(), record).is_some() {
        diagnostics.warn(format!("Duplicate {what} name {name:?}; keeping the right-most column"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_ignore_padding() {
        assert!(is_missing(""));
        assert!(is_missing(" NA "));
        assert!(is_missing("N/A"));
        assert!(!is_missing("n/a"));
        assert!(!is_missing("Buffer A"));
    }

    #[test]
    fn version_numbers_map_to_layouts() {
        assert_eq!(TemplateVersion::from_number(1), Some(TemplateVersion::V1));
        assert_eq!(TemplateVersion::from_number(2), Some(TemplateVersion::V2));
        assert_eq!(TemplateVersion::from_number(3), None);
        assert_eq!(TemplateVersion::V1.layout().general_section, "General Experiment Information");
        assert_eq!(CURRENT_VERSION.layout().general_section, "General Study Information");
    }

    #[test]
    fn duplicate_names_keep_the_later_record() {
        let mut diagnostics = Diagnostics::default();
        let mut records = BTreeMap::new();
        insert_named(&mut records, "Load".to_owned(), 1, "load", &mut diagnostics);
        insert_named(&mut records, "Load".to_owned(), 2, "load", &mut diagnostics);
        assert_eq!(records["Load"], 2);
        assert_eq!(diagnostics.len(), 1);
    }
}

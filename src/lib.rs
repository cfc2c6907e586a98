//! # Chromatography Study Workbook Reader
//!
//! Reads the lab's chromatography study input template (an `.xlsx` or `.xls`
//! workbook) into validated, structured records ready to be turned into
//! domain objects.
//!
//! ## Features
//!
//! - **Two template revisions**: the version number in cell `E1` selects the
//!   layout; a blank cell means the deprecated first revision
//! - **Section discovery**: sections may appear in any order with any amount
//!   of padding; instance columns are discovered from the data
//! - **Product validation**: assay names found in the workbook are checked
//!   against a [`ProductCatalog`]
//! - **All-or-nothing reads**: a failure aborts the whole read and names the
//!   category it happened in
//! - **Diagnostics**: non-fatal findings are logged through `log` and returned
//!   with the data
//! - **Pure Rust containers**: OOXML and BIFF8 parsing without external tools
//!
//! ## Categories
//!
//! [`ExcelReader::get_all_data`] returns a [`StudyData`] holding:
//!
//! - `general_data`, `system_data`, `column_data`: flat records
//! - `load_data`, `buffer_prep_data`: records keyed by instance name
//! - `experiment_data`: method, performance, fraction and continuous data
//!   keyed by experiment name

mod diagnostics;
mod error;
mod helpers;
mod reader;
mod schema;
mod selector;
pub mod spreadsheet;
pub mod template;

pub use crate::diagnostics::Diagnostic;
pub use crate::diagnostics::Diagnostics;
pub use crate::error::ChromaSheetError;
pub use crate::reader::ExcelReader;
pub use crate::schema::check_known_assay;
pub use crate::schema::validate_assays;
pub use crate::schema::InMemoryCatalog;
pub use crate::schema::ProductCatalog;
pub use crate::schema::ProductSchema;
pub use crate::schema::SchemaError;
pub use crate::selector::select_reader;
pub use crate::selector::version_from_grid;
pub use crate::selector::ReaderSelector;
pub use crate::template::records::BufferChemical;
pub use crate::template::records::BufferRecord;
pub use crate::template::records::ChemicalState;
pub use crate::template::records::ExperimentRecord;
pub use crate::template::records::FractionRecord;
pub use crate::template::records::LoadRecord;
pub use crate::template::records::MethodRecord;
pub use crate::template::records::PerformanceRecord;
pub use crate::template::records::Record;
pub use crate::template::records::StepRecord;
pub use crate::template::records::StudyData;
pub use crate::template::records::Value;
pub use crate::template::ExtractError;
pub use crate::template::LocateError;
pub use crate::template::TemplateVersion;

//! Picks the reader matching the template version stored in the workbook.

use crate::error::ChromaSheetError;
use crate::reader::ExcelReader;
use crate::reader::SheetCache;
use crate::schema::ProductCatalog;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::template::ExtractError;
use crate::template::TemplateVersion;
use crate::template::VERSION_CELL;
use std::path::Path;
use std::path::PathBuf;

/// Builds the reader for a workbook file.
///
/// ```no_run
/// use chroma_sheet::{InMemoryCatalog, ReaderSelector};
///
/// let catalog = InMemoryCatalog::from_json(r#"[{"name": "Prod001", "product_component_assays": ["Native"]}]"#)?;
/// let mut reader = ReaderSelector::new("study.xlsx").build_reader(&catalog)?;
/// let study = reader.get_all_data()?;
/// println!("{}", study.to_json_pretty()?);
/// # Ok::<(), chroma_sheet::ChromaSheetError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ReaderSelector {
    path: PathBuf,
}

impl ReaderSelector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        ReaderSelector { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn build_reader<'c>(&self, catalog: &'c dyn ProductCatalog) -> Result<ExcelReader<'c>, ChromaSheetError> {
        if !self.path.is_file() {
            Err(ExtractError::InvalidFilePath { path: self.path.display().to_string() })?
        }
        select_reader(open_spreadsheet(&self.path)?, catalog)
    }
}

/// Reader for an already opened workbook, versioned from its first worksheet.
pub fn select_reader<'c>(
    spreadsheet: Box<dyn Spreadsheet>,
    catalog: &'c dyn ProductCatalog,
) -> Result<ExcelReader<'c>, ChromaSheetError> {
    let mut cache = SheetCache::new(spreadsheet);
    let version = version_from_grid(&*cache.sheet(None)?)?;
    log::debug!("Reading {} as template {version}", cache.file_name());
    Ok(ExcelReader::with_cache(cache, version, catalog))
}

/// Version number held in the version cell; a blank (or zero) cell means
/// the first revision.
pub fn version_from_grid(grid: &Grid) -> Result<TemplateVersion, ChromaSheetError> {
    let (row, col) = reference_to_index(VERSION_CELL).expect("version cell is a valid reference");
    let text = grid.text(row, col);
    let text = text.trim();
    if text.is_empty() {
        return Ok(TemplateVersion::V1);
    }

    let number = grid.get(row, col).and_then(|cell| cell.to_number());
    let version = match number {
        Some(number) if number == 0.0 => Some(TemplateVersion::V1),
        Some(number) if number.fract() == 0.0 => TemplateVersion::from_number(number as i64),
        _ => None,
    };
    match version {
        Some(version) => Ok(version),
        None => Err(ExtractError::UnsupportedVersion { version: text.to_owned() })?,
    }
}

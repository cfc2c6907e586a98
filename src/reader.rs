//! Reader session for one study workbook.

use crate::diagnostics::Diagnostics;
use crate::error::ChromaSheetError;
use crate::error::ResultCategory;
use crate::schema::ProductCatalog;
use crate::schema::ProductSchema;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::template::fraction;
use crate::template::insert_named;
use crate::template::is_missing;
use crate::template::layout::read_continuous_cells;
use crate::template::layout::Label;
use crate::template::locator::find_section;
use crate::template::locator::section_width;
use crate::template::records::BufferRecord;
use crate::template::records::ExperimentRecord;
use crate::template::records::LoadRecord;
use crate::template::records::Record;
use crate::template::records::StudyData;
use crate::template::Context;
use crate::template::TemplateVersion;
use crate::template::CURRENT_VERSION;
use crate::template::FIRST_CONTENT_COL;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

/// Worksheets loaded from one workbook, each read at most once.
pub(crate) struct SheetCache {
    spreadsheet: Box<dyn Spreadsheet>,
    sheets: HashMap<String, Rc<Grid>>,
}

impl SheetCache {
    pub(crate) fn new(spreadsheet: Box<dyn Spreadsheet>) -> Self {
        SheetCache { spreadsheet, sheets: HashMap::new() }
    }

    pub(crate) fn file_name(&self) -> String {
        self.spreadsheet.name()
    }

    /// The named worksheet, or the first one for `None`.
    pub(crate) fn sheet(&mut self, name: Option<&str>) -> Result<Rc<Grid>, ChromaSheetError> {
        let name = match name {
            Some(name) => name.to_owned(),
            None => match self.spreadsheet.sheet_names().into_iter().next() {
                Some(name) => name,
                None => Err(SpreadsheetError::Empty(self.spreadsheet.name()))?,
            },
        };
        if let Some(grid) = self.sheets.get(&name) {
            return Ok(Rc::clone(grid));
        }
        log::debug!("Loading worksheet {name:?} of {}", self.spreadsheet.name());
        let grid = Rc::new(self.spreadsheet.read_sheet(&name)?);
        self.sheets.insert(name, Rc::clone(&grid));
        Ok(grid)
    }
}

/// Extracts the study categories from a workbook laid out as one template version.
///
/// A reader is built for one file and used once; see
/// [`ReaderSelector`](crate::ReaderSelector) to pick the version from the file itself.
pub struct ExcelReader<'c> {
    file_name: String,
    version: TemplateVersion,
    cache: SheetCache,
    catalog: &'c dyn ProductCatalog,
    product: Option<Rc<ProductSchema>>,
    diagnostics: Diagnostics,
}

impl<'c> ExcelReader<'c> {
    pub fn from_spreadsheet(
        spreadsheet: Box<dyn Spreadsheet>,
        version: TemplateVersion,
        catalog: &'c dyn ProductCatalog,
    ) -> Self {
        Self::with_cache(SheetCache::new(spreadsheet), version, catalog)
    }

    pub(crate) fn with_cache(cache: SheetCache, version: TemplateVersion, catalog: &'c dyn ProductCatalog) -> Self {
        let mut diagnostics = Diagnostics::default();
        if version != CURRENT_VERSION {
            diagnostics.warn(format!(
                "This version ({}) of the Excel input file is DEPRECATED, and shouldn't be used anymore. \
                 Please move your data to the newest format version ({})",
                version.number(),
                CURRENT_VERSION.number()
            ));
        }
        ExcelReader {
            file_name: cache.file_name(),
            version,
            cache,
            catalog,
            product: None,
            diagnostics,
        }
    }

    pub fn version(&self) -> TemplateVersion {
        self.version
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Findings recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Product named in the general section, looked up once in the catalog.
    pub fn product(&mut self) -> Result<Rc<ProductSchema>, ChromaSheetError> {
        if let Some(product) = &self.product {
            return Ok(Rc::clone(product));
        }
        let sheet = self.cache.sheet(None)?;
        let section_start = find_section(&sheet, self.version.layout().general_section)?;
        let name = sheet.text(section_start + 1, FIRST_CONTENT_COL);
        let product = Rc::new(self.catalog.lookup(name.trim())?);
        self.product = Some(Rc::clone(&product));
        Ok(product)
    }

    pub fn get_general_data(&mut self) -> Result<Record, ChromaSheetError> {
        let layout = self.version.layout();
        self.flat_section_data(layout.general_section, layout.general_labels)
    }

    pub fn get_system_data(&mut self) -> Result<Record, ChromaSheetError> {
        let layout = self.version.layout();
        self.flat_section_data(layout.system_section, layout.system_labels)
    }

    pub fn get_column_data(&mut self) -> Result<Record, ChromaSheetError> {
        let layout = self.version.layout();
        self.flat_section_data(layout.column_section, layout.column_labels)
    }

    fn flat_section_data(&mut self, section: &str, labels: &[Label]) -> Result<Record, ChromaSheetError> {
        let sheet = self.cache.sheet(None)?;
        let section_start = find_section(&sheet, section)?;
        read_continuous_cells(labels, section_start + 1, FIRST_CONTENT_COL, &sheet)
    }

    /// Loads keyed by name.
    pub fn get_load_data(&mut self) -> Result<BTreeMap<String, LoadRecord>, ChromaSheetError> {
        let sheet = self.cache.sheet(None)?;
        let product = self.product()?;
        let mut context = Context {
            sheet: &sheet,
            product: &product,
            layout: self.version.layout(),
            diagnostics: &mut self.diagnostics,
        };
        self.version.load_data(&mut context)
    }

    /// Buffers keyed by name.
    pub fn get_buffer_prep_data(&mut self) -> Result<BTreeMap<String, BufferRecord>, ChromaSheetError> {
        let sheet = self.cache.sheet(None)?;
        let product = self.product()?;
        let mut context = Context {
            sheet: &sheet,
            product: &product,
            layout: self.version.layout(),
            diagnostics: &mut self.diagnostics,
        };
        self.version.buffer_prep_data(&mut context)
    }

    /// Experiments keyed by name, one per column of the method section.
    pub fn get_experiment_data(&mut self) -> Result<BTreeMap<String, ExperimentRecord>, ChromaSheetError> {
        let sheet = self.cache.sheet(None)?;
        let product = self.product()?;
        let layout = self.version.layout();

        let method_start = find_section(&sheet, layout.method_section)?;
        let performance_start = find_section(&sheet, layout.performance_section)?;
        let fraction_start = find_section(&sheet, layout.fraction_section)?;
        let continuous_start = find_section(&sheet, layout.continuous_section)?;

        let mut experiments = BTreeMap::new();
        for col in FIRST_CONTENT_COL..section_width(&sheet, method_start) {
            log::debug!("Reading experiment in column {col}");
            let mut context = Context { sheet: &sheet, product: &product, layout, diagnostics: &mut self.diagnostics };

            let method_data = self.version.method_data(&mut context, method_start, col)?;
            let performance_parameter_data = self.version.performance_data(&mut context, performance_start, col)?;
            let fraction_data = match fraction::fraction_sheet_name(&sheet, fraction_start, col) {
                Some(name) => {
                    let fractions = self.cache.sheet(Some(&name))?;
                    Some(fraction::fraction_data(&fractions, &product, context.diagnostics)?)
                }
                None => None,
            };
            let continuous = sheet.text(continuous_start + 1, col);
            let continuous_data = if is_missing(&continuous) { None } else { Some(continuous) };

            let name = method_data.fields.text("experiment_name").unwrap_or_default().to_owned();
            let experiment = ExperimentRecord {
                method_data,
                performance_parameter_data,
                fraction_data,
                continuous_data,
            };
            insert_named(&mut experiments, name, experiment, "experiment", context.diagnostics);
        }
        Ok(experiments)
    }

    fn read_category<T>(
        &mut self,
        category: &str,
        read: impl FnOnce(&mut Self) -> Result<T, ChromaSheetError>,
    ) -> Result<T, ChromaSheetError> {
        log::debug!("Reading {category} of {}", self.file_name);
        self.diagnostics.enter(category);
        let file_name = self.file_name.to_owned();
        read(self).in_category(category, &file_name)
    }

    /// Reads every category. Any failure aborts the whole read, naming the
    /// category it happened in.
    pub fn get_all_data(&mut self) -> Result<StudyData, ChromaSheetError> {
        let mut study = StudyData {
            general_data: self.read_category("general_data", Self::get_general_data)?,
            system_data: self.read_category("system_data", Self::get_system_data)?,
            column_data: self.read_category("column_data", Self::get_column_data)?,
            load_data: self.read_category("load_data", Self::get_load_data)?,
            buffer_prep_data: self.read_category("buffer_prep_data", Self::get_buffer_prep_data)?,
            experiment_data: self.read_category("experiment_data", Self::get_experiment_data)?,
            diagnostics: Vec::new(),
        };
        self.diagnostics.enter("");
        study.diagnostics = self.diagnostics.take();
        Ok(study)
    }
}

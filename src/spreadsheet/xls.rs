use crate::error::ChromaSheetError;
use crate::error::ResultOptionChain;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use either::Either;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;
const EOF: u16 = 10;
const DATE1904: u16 = 34;
const FILE_PASS: u16 = 47;
const CODE_PAGE: u16 = 66;
const BOUND_SHEET8: u16 = 133;
const MUL_RK: u16 = 189;
const XF: u16 = 224;
const SST: u16 = 252;
const LABEL_SST: u16 = 253;
const NUMBER: u16 = 515;
const LABEL: u16 = 516;
const BOOL_ERR: u16 = 517;
const STRING: u16 = 519;
const ARRAY: u16 = 545;
const TABLE: u16 = 566;
const RK: u16 = 638;
const FORMAT: u16 = 1054;
const SHARED_FORMULA: u16 = 1212;
const BOF: u16 = 2057;

/// BOUNDSHEET8 `dt` value for an ordinary worksheet
const WORKSHEET: u8 = 0;

#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid code page '{0}'")]
    CodePage(u16),

    #[error("Formula cell has no cached result (flags {0:#x})")]
    FormulaValue(u64),
}

/// Cell kind known directly, or a style index still to be resolved.
type CellKind = Either<CellType, usize>;

/// Excel 97-2003 workbook (`.xls`).
pub(crate) struct XlsSpreadsheet {
    name: String,
    reader: Biff8Reader,
    shared_strings: Vec<String>,
    number_formats: Vec<CellType>,
    /// (sheet name, BOF offset in the workbook stream)
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    pub(crate) fn open(path: &Path) -> Result<XlsSpreadsheet, ChromaSheetError> {
        let name = path.display().to_string();
        let cfb = Cfb::new(&mut BufReader::new(File::open(path)?))?;
        let stream = cfb
            .read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .ok_or_else(|| SpreadsheetError::Empty(name.to_owned()))?;
        Self::from_stream(name, stream)
    }

    /// Reads the workbook globals substream: strings, formats, sheet directory.
    fn from_stream(name: String, stream: Vec<u8>) -> Result<XlsSpreadsheet, ChromaSheetError> {
        let mut reader = Biff8Reader::new(stream);
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut custom_formats = HashMap::new();
        let mut format_ids = Vec::new();
        let mut sheets = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS => Err(SpreadsheetError::PasswordProtected(name.to_owned()))?,
            DATE1904 => is_1904 = reader.read_u16()? == 1,
            CODE_PAGE => {
                let code_page = reader.read_u16()?;
                reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePage(code_page))?;
            }
            FORMAT => {
                let id = reader.read_u16()?;
                let code = reader.read_string()?;
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&code, is_1904));
            }
            XF => {
                reader.skip(2)?;
                format_ids.push(reader.read_u16()?.to_string());
            }
            SST => shared_strings = load_shared_strings(&mut reader)?,
            BOUND_SHEET8 => {
                let position = reader.read_index()?;
                let _visibility = reader.read_u8()?;
                let sheet_type = reader.read_u8()?;
                let sheet_name = reader.read_short_string()?;
                if sheet_type == WORKSHEET {
                    sheets.push((sheet_name, position));
                }
            }
        });
        if sheets.is_empty() {
            Err(SpreadsheetError::Empty(name.to_owned()))?;
        }
        log::debug!("opened {name} with {} worksheets", sheets.len());

        Ok(XlsSpreadsheet {
            name,
            reader,
            shared_strings,
            number_formats: load_number_formats(format_ids, custom_formats, is_1904),
            sheets,
        })
    }

    fn resolve(&self, kind: CellKind) -> CellType {
        match kind {
            Either::Left(kind) => kind,
            Either::Right(style) => self.number_formats.get(style).copied().unwrap_or(CellType::Number),
        }
    }
}

impl Spreadsheet for XlsSpreadsheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, ChromaSheetError> {
        let position = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, position)| *position)
            .ok_or_else(|| SpreadsheetError::SheetNotFound {
                file: self.name.to_owned(),
                sheet: sheet_name.to_owned(),
            })?;

        let mut grid = Grid::new(sheet_name);
        self.reader.goto(position);
        self.reader.next()?;
        while let Some(record) = self.reader.next()? {
            match record {
                BOF | EOF => break,
                MUL_RK => {
                    let row = self.reader.read_u16()? as usize;
                    let first_col = self.reader.read_u16()? as usize;
                    let last_col = self.reader.trailing_u16()? as usize;
                    for col in first_col..=last_col {
                        let style = self.reader.read_u16()? as usize;
                        let value = self.reader.read_rk_number()?;
                        grid.push(Cell::new(row, col, self.resolve(Either::Right(style)), value.to_string()));
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = self.reader.read_u16()? as usize;
                    let col = self.reader.read_u16()? as usize;
                    let (kind, value) = match record {
                        BOOL_ERR => read_bool_or_error_cell(&mut self.reader)?,
                        NUMBER => read_number_cell(&mut self.reader)?,
                        RK => read_rk_cell(&mut self.reader)?,
                        LABEL_SST => read_label_sst_cell(&mut self.reader, &self.shared_strings)?,
                        LABEL => read_label_cell(&mut self.reader)?,
                        _ => read_formula_cell(&mut self.reader)?,
                    };
                    grid.push(Cell::new(row, col, self.resolve(kind), value));
                }
                _ => (),
            }
        }
        Ok(grid)
    }
}

fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, ChromaSheetError> {
    // total reference count, then unique string count
    reader.skip(4)?;
    let count = reader.read_index()?;
    (0..count).map(|_| reader.read_rich_string()).collect()
}

fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ChromaSheetError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let is_error = reader.read_u8()? != 0;
    Ok(if is_error {
        (Either::Left(CellType::Error), to_error_value(value).to_owned())
    } else {
        (Either::Left(CellType::Boolean), value.to_string())
    })
}

fn read_number_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ChromaSheetError> {
    let style = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(style), value.to_string()))
}

fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ChromaSheetError> {
    let style = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(style), value.to_string()))
}

fn read_label_sst_cell(reader: &mut Biff8Reader, shared_strings: &[String]) -> Result<(CellKind, String), ChromaSheetError> {
    reader.skip(2)?;
    let index = reader.read_index()?;
    let value = shared_strings.get(index).cloned().unwrap_or_default();
    Ok((Either::Left(CellType::Text), value))
}

fn read_label_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ChromaSheetError> {
    reader.skip(2)?;
    Ok((Either::Left(CellType::Text), reader.read_string()?))
}

/// A formula's cached result is either an f64, or a tagged value whose high
/// word is 0xFFFF; string results follow in a separate STRING record.
fn read_formula_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ChromaSheetError> {
    let style = reader.read_u16()? as usize;
    let bits = reader.read_f64()?.to_bits();
    if bits & 0xFFFF_0000_0000_0000 != 0xFFFF_0000_0000_0000 {
        return Ok((Either::Right(style), f64::from_bits(bits).to_string()));
    }
    match bits & 0xFF {
        0 => {
            while let Some(record) = reader.next()? {
                match record {
                    STRING => return Ok((Either::Left(CellType::Text), reader.read_string()?)),
                    SHARED_FORMULA | ARRAY | TABLE => continue,
                    _ => break,
                }
            }
            Err(XlsError::FormulaValue(bits))?
        }
        1 => {
            let value = if (bits >> 16) & 0xFF != 0 { "1" } else { "0" };
            Ok((Either::Left(CellType::Boolean), value.to_owned()))
        }
        2 => Ok((Either::Left(CellType::Error), to_error_value(((bits >> 16) & 0xFF) as u8).to_owned())),
        3 => Ok((Either::Left(CellType::Text), String::new())),
        _ => Err(XlsError::FormulaValue(bits))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: u16, body: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&kind.to_le_bytes());
        bytes.extend_from_slice(&(body.len() as u16).to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    /// Row, column and an unused style index.
    fn cell_header(row: u16, col: u16) -> Vec<u8> {
        [row.to_le_bytes(), col.to_le_bytes(), 0u16.to_le_bytes()].concat()
    }

    /// XLUnicodeString with an 8-bit character body.
    fn string(text: &str) -> Vec<u8> {
        let mut bytes = (text.len() as u16).to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    fn rk_integer(value: u32) -> [u8; 4] {
        ((value << 2) | 0b10).to_le_bytes()
    }

    fn globals(sheets: &[(&str, u8)], strings: &[&str], sheet_offset: usize) -> Vec<u8> {
        let mut stream = record(BOF, &[0; 16]);
        for (name, sheet_type) in sheets {
            let mut body = (sheet_offset as u32).to_le_bytes().to_vec();
            body.extend_from_slice(&[0, *sheet_type, name.len() as u8, 0]);
            body.extend_from_slice(name.as_bytes());
            stream.extend(record(BOUND_SHEET8, &body));
        }
        let mut sst = [(strings.len() as u32).to_le_bytes(), (strings.len() as u32).to_le_bytes()].concat();
        for text in strings {
            sst.extend(string(text));
        }
        stream.extend(record(SST, &sst));
        stream.extend(record(EOF, &[]));
        stream
    }

    fn workbook() -> Vec<u8> {
        let strings = ["Method Information", "Experiment Name"];
        // the sheet substream starts right after the globals, whose length
        // does not depend on the offset value itself
        let offset = globals(&[("Input", WORKSHEET), ("Chart1", 2)], &strings, 0).len();
        let mut stream = globals(&[("Input", WORKSHEET), ("Chart1", 2)], &strings, offset);

        stream.extend(record(BOF, &[0; 16]));
        stream.extend(record(LABEL_SST, &[cell_header(0, 0), 0u32.to_le_bytes().to_vec()].concat()));
        stream.extend(record(LABEL_SST, &[cell_header(1, 1), 1u32.to_le_bytes().to_vec()].concat()));
        stream.extend(record(LABEL, &[cell_header(1, 3), string("Run 1")].concat()));
        stream.extend(record(RK, &[cell_header(2, 3), rk_integer(7).to_vec()].concat()));

        let mut mul_rk = [3u16.to_le_bytes(), 3u16.to_le_bytes()].concat();
        for value in [150, 200] {
            mul_rk.extend_from_slice(&0u16.to_le_bytes());
            mul_rk.extend_from_slice(&rk_integer(value));
        }
        mul_rk.extend_from_slice(&4u16.to_le_bytes());
        stream.extend(record(MUL_RK, &mul_rk));

        stream.extend(record(NUMBER, &[cell_header(4, 3), 2.5f64.to_le_bytes().to_vec()].concat()));

        // cached string result, then the formula body, then its STRING record
        let mut formula = cell_header(5, 3);
        formula.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        formula.extend_from_slice(&[0; 6]);
        stream.extend(record(FORMULA, &formula));
        stream.extend(record(STRING, &string("elution")));

        stream.extend(record(BOOL_ERR, &[cell_header(6, 3), vec![0x07, 1]].concat()));
        stream.extend(record(EOF, &[]));
        stream
    }

    #[test]
    fn lists_only_worksheets() {
        let spreadsheet = XlsSpreadsheet::from_stream("study.xls".to_owned(), workbook()).unwrap();
        assert_eq!(spreadsheet.name(), "study.xls");
        assert_eq!(spreadsheet.sheet_names(), vec!["Input"]);
    }

    #[test]
    fn reads_cell_records_into_a_grid() {
        let mut spreadsheet = XlsSpreadsheet::from_stream("study.xls".to_owned(), workbook()).unwrap();
        let grid = spreadsheet.read_sheet("Input").unwrap();

        assert_eq!(grid.name(), "Input");
        assert_eq!(grid.text(0, 0), "Method Information");
        assert_eq!(grid.text(1, 1), "Experiment Name");
        assert_eq!(grid.text(1, 3), "Run 1");
        assert_eq!(grid.integer(2, 3).unwrap(), 7);
        assert_eq!(grid.number(3, 3).unwrap(), 150.0);
        assert_eq!(grid.number(3, 4).unwrap(), 200.0);
        assert_eq!(grid.number(4, 3).unwrap(), 2.5);
        assert_eq!(grid.text(5, 3), "elution");
        assert_eq!(grid.text(6, 3), "#DIV/0!");
        assert_eq!(grid.row_count(), 7);
    }

    #[test]
    fn unknown_sheets_are_reported() {
        let mut spreadsheet = XlsSpreadsheet::from_stream("study.xls".to_owned(), workbook()).unwrap();
        let error = spreadsheet.read_sheet("Chart1").err().map(|error| error.to_string());
        assert_eq!(error.as_deref(), Some("Worksheet 'Chart1' not found in 'study.xls'"));
    }

    #[test]
    fn encrypted_workbooks_are_rejected() {
        let mut stream = record(BOF, &[0; 16]);
        stream.extend(record(FILE_PASS, &[0; 6]));
        stream.extend(record(EOF, &[]));
        let error = XlsSpreadsheet::from_stream("secret.xls".to_owned(), stream).err();
        assert!(matches!(
            error,
            Some(ChromaSheetError::SpreadsheetError(SpreadsheetError::PasswordProtected(name))) if name == "secret.xls"
        ));
    }

    #[test]
    fn workbooks_without_worksheets_are_empty() {
        let stream = globals(&[("Chart1", 2)], &[], 0);
        let error = XlsSpreadsheet::from_stream("charts.xls".to_owned(), stream).err().map(|error| error.to_string());
        assert_eq!(error.as_deref(), Some("Spreadsheet 'charts.xls' contains no worksheets"));
    }
}

use crate::error::ChromaSheetError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::FileReader;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use zip::ZipArchive;

const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// Office Open XML workbook (`.xlsx` / `.xlsm`).
pub(crate) struct XlsxSpreadsheet {
    name: String,
    zip: ZipArchive<FileReader>,
    number_formats: Vec<CellType>,
    /// Loaded on the first worksheet read
    shared_strings: Option<Vec<String>>,
    /// (sheet name, part path)
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet {
    pub(crate) fn open(path: &Path) -> Result<XlsxSpreadsheet, ChromaSheetError> {
        let name = path.display().to_string();
        let mut zip = excel::open_zip(path)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::Empty(name.to_owned()))?;
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        log::debug!("opened {name} with {} worksheets", sheets.len());
        Ok(XlsxSpreadsheet { name, zip, number_formats, shared_strings: None, sheets })
    }

    fn load_shared_strings(&mut self) -> Result<(), ChromaSheetError> {
        if self.shared_strings.is_some() {
            return Ok(());
        }
        let mut shared_strings = Vec::new();
        if let Some(mut reader) = self.zip.xml_reader("xl/sharedStrings.xml")? {
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                    shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
                }
            });
        }
        self.shared_strings = Some(shared_strings);
        Ok(())
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, ChromaSheetError> {
        let path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFound {
                file: self.name.to_owned(),
                sheet: sheet_name.to_owned(),
            })?;
        self.load_shared_strings()?;
        let shared_strings = self.shared_strings.as_deref().unwrap_or_default();
        let number_formats = &self.number_formats;

        let mut grid = Grid::new(sheet_name);
        let mut reader = self
            .zip
            .xml_reader(&path)?
            .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
        let mut next_row = 0usize;
        let mut next_col = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::Empty;
        let mut is_shared = false;
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TAG_ROW => {
                next_row += 1;
                next_col = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event
                    .get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((next_row, next_col));
                next_row = row;
                next_col = col + 1;
                value.clear();
                let cell_type = event.get_attribute_value("t")?;
                is_shared = cell_type.as_deref() == Some("s");
                kind = match cell_type.as_deref() {
                    Some("s") | Some("inlineStr") | Some("str") => CellType::Text,
                    Some("d") => CellType::IsoDateTime,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Error,
                    _ => CellType::Number,
                };
                if kind == CellType::Number {
                    if let Some(style) = event.get_attribute_value("s")? {
                        if let Ok(index) = style.parse::<usize>() {
                            kind = number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                let text = if is_shared {
                    value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| shared_strings.get(index))
                        .cloned()
                        .unwrap_or_default()
                } else {
                    std::mem::take(&mut value)
                };
                grid.push(Cell::new(row, col, kind, text));
                kind = CellType::Empty;
                is_shared = false;
            }
        });
        Ok(grid)
    }
}

/// Reads sheet names, their part paths and the date system from `xl/workbook.xml`.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), ChromaSheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.get_value()?),
                    b"id" => id = Some(attribute.get_value()?),
                    _ => (),
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.into_owned(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event
                .get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Reads `xl/styles.xml` into one cell kind per cell style index.
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, ChromaSheetError> {
    let Some(mut reader) = zip.xml_reader("xl/styles.xml")? else {
        return Ok(Vec::new());
    };
    let mut in_custom_formats = false;
    let mut in_format_indexes = false;
    let mut custom_formats = HashMap::new();
    let mut format_ids = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = false,
        Event::Start(event) if in_custom_formats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let code = event.get_attribute_value("formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                custom_formats.insert(id.into_owned(), CellType::parse_custom_number_format(&code, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if in_format_indexes && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_ids.push(id.map(Cow::into_owned).unwrap_or_else(|| "0".to_owned()));
        }
    });
    Ok(excel::load_number_formats(format_ids, custom_formats, is_1904))
}

/// Collects the text of a string item or value element, skipping phonetic runs.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, ChromaSheetError> {
    let mut in_phonetic = false;
    let mut in_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = false,
        Event::Start(event) if !in_phonetic && event.name() == TAG_TEXT => in_text = true,
        Event::End(event) if in_text && event.name() == TAG_TEXT => in_text = false,
        Event::Text(event) if in_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if in_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_items_skip_phonetic_runs() {
        let xml = "<si><r><t>Buf</t></r><r><t xml:space=\"preserve\">fer A</t></r><rPh><t>ignored</t></rPh></si>";
        let mut reader = XmlReader::new(xml.as_bytes());
        // step past the opening <si>
        assert!(reader.next().unwrap().is_some());
        let text = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false).unwrap();
        assert_eq!(text, "Buffer A");
    }

    #[test]
    fn value_elements_are_text_by_default() {
        let xml = "<v>8.4</v>";
        let mut reader = XmlReader::new(xml.as_bytes());
        assert!(reader.next().unwrap().is_some());
        assert_eq!(read_string_value(&mut reader, TAG_VALUE, true).unwrap(), "8.4");
    }
}

//! Pieces shared by the `.xlsx` and `.xls` readers.
use crate::error::ChromaSheetError;
use crate::helpers::cfb::Cfb;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use zip::ZipArchive;

pub(crate) type FileReader = BufReader<File>;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Opens a workbook's ZIP container after ruling out encrypted packages.
pub(super) fn open_zip(path: &Path) -> Result<ZipArchive<FileReader>, ChromaSheetError> {
    let mut reader = BufReader::new(File::open(path)?);
    if is_password_protected(&mut reader) {
        Err(SpreadsheetError::PasswordProtected(path.display().to_string()))?;
    }
    reader.seek(SeekFrom::Start(0))?;
    Ok(ZipArchive::new(reader)?)
}

/// Maps relationship ids to worksheet part paths.
pub(super) fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<HashMap<String, String>, ChromaSheetError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|kind| kind.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.into_owned(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves each cell style's number format id to the cell kind it implies.
pub(super) fn load_number_formats(
    format_ids: Vec<String>,
    custom_formats: HashMap<String, CellType>,
    is_1904: bool,
) -> Vec<CellType> {
    format_ids
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Relationship targets may be absolute or relative to `xl/`.
pub(crate) fn to_zip_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_owned()
    } else if target.starts_with("xl/") {
        target.to_owned()
    } else {
        format!("xl/{target}")
    }
}

/// Encrypted OOXML files are OLE containers holding an `EncryptedPackage` stream.
fn is_password_protected<RS: Read + Seek>(reader: &mut RS) -> bool {
    Cfb::new(reader)
        .map(|cfb| cfb.exists("EncryptedPackage"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_targets_resolve_inside_xl() {
        assert_eq!(to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn style_indexes_map_to_cell_kinds() {
        let mut custom = HashMap::new();
        custom.insert("164".to_owned(), CellType::NumberDate1900);
        let kinds = load_number_formats(vec!["0".into(), "14".into(), "164".into()], custom, true);
        assert_eq!(kinds, vec![CellType::Number, CellType::NumberDate1904, CellType::NumberDate1900]);
    }
}

use thiserror::Error;

/// Main error type for the chroma_sheet crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum ChromaSheetError {
    /// A study category failed to load; wraps the underlying cause.
    #[error("Failed to parse the {category} part of the input file {file}. Error was {source}.")]
    CategoryError {
        category: String,
        file: String,
        source: Box<ChromaSheetError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Grid layer errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),

    // Template engine errors
    #[error("{0}")]
    LocateError(#[from] crate::template::LocateError),

    #[error("{0}")]
    ExtractError(#[from] crate::template::ExtractError),

    #[error("{0}")]
    SchemaError(#[from] crate::schema::SchemaError),
}

impl ChromaSheetError {
    /// Walks through category wrappers down to the error that started it.
    pub fn root_cause(&self) -> &ChromaSheetError {
        match self {
            ChromaSheetError::CategoryError { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the underlying failure is a name lookup against the product definition.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self.root_cause(), ChromaSheetError::SchemaError(_))
    }
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultCategory {
    /// Tags a failure with the study category and file it happened in.
    fn in_category(self, category: &str, file: &str) -> Self;
}

impl<T> ResultCategory for Result<T, ChromaSheetError> {
    fn in_category(self, category: &str, file: &str) -> Self {
        self.map_err(|error| ChromaSheetError::CategoryError {
            category: category.replace('_', " "),
            file: file.to_owned(),
            source: Box::new(error),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    #[test]
    fn category_wrapping_keeps_root_cause() {
        let result: Result<(), ChromaSheetError> = Err(SchemaError::UnknownAssay {
            assay: "Foo".to_owned(),
            known: vec!["Bar".to_owned()],
        }
        .into());
        let error = result.in_category("load_data", "study.xlsx").unwrap_err();

        let message = error.to_string();
        assert!(message.starts_with("Failed to parse the load data part of the input file study.xlsx."));
        assert!(message.contains("Foo"));
        assert!(error.is_lookup_error());
    }

    #[test]
    fn ok_none_else_falls_back_only_on_none() {
        let first: Result<Option<u8>, ()> = Ok(None);
        assert_eq!(first.ok_none_else(|| Ok(Some(2))), Ok(Some(2)));
        let second: Result<Option<u8>, ()> = Ok(Some(1));
        assert_eq!(second.ok_none_else(|| Ok(Some(2))), Ok(Some(1)));
    }
}

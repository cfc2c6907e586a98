//! Streaming XML helpers for the OOXML parts of `.xlsx` workbooks.

use crate::error::ChromaSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),
}

/// Event reader tuned for worksheet parts: whitespace is kept because it can
/// be cell content, and empty elements expand into start/end pairs.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader { reader, buffer: Vec::with_capacity(1024) }
    }

    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, ChromaSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, ChromaSheetError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, ChromaSheetError> {
        Ok(self.unescape_value()?)
    }
}

pub(crate) trait XmlNodeHelper<'a> {
    /// Unescaped value of the named attribute, if present.
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ChromaSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ChromaSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }
}

pub(crate) trait XmlTextContextHelper {
    /// Appends the character an entity or numeric reference stands for.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ChromaSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ChromaSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.into_owned()))?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::name::QName;

    #[test]
    fn reads_attributes_and_entities() {
        let xml = r#"<c r="B2" t="s"><v>a&amp;b&#x41;</v></c>"#;
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut reference = None;
        let mut text = String::new();
        let mut in_value = false;
        let result: Result<(), ChromaSheetError> = (|| {
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == QName(b"c") => {
                    reference = event.get_attribute_value("r")?.map(|value| value.into_owned());
                }
                Event::Start(event) if event.name() == QName(b"v") => in_value = true,
                Event::End(event) if event.name() == QName(b"v") => in_value = false,
                Event::Text(event) if in_value => text.push_str(&event.xml_content()?),
                Event::GeneralRef(event) if in_value => text.push_bytes_ref(&event)?,
            });
            Ok(())
        })();

        assert!(result.is_ok());
        assert_eq!(reference.as_deref(), Some("B2"));
        assert_eq!(text, "a&bA");
    }
}

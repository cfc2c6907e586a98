//! Record reader for the BIFF8 stream of Excel 97-2003 (`.xls`) workbooks.
//!
//! A record is a `(type, size)` header followed by its body. Bodies longer than
//! 8224 bytes spill into `CONTINUE` records; the reader stitches those segments
//! back together so callers read one logical record at a time.

use crate::error::ChromaSheetError;
use crate::helpers::bytes::le_f64;
use crate::helpers::bytes::le_index;
use crate::helpers::bytes::le_u16;
use crate::helpers::bytes::le_u32;
use encoding_rs::Encoding;
use encoding_rs::UTF_16LE;
use std::ops::Range;
use thiserror::Error;

const CONTINUE: u16 = 60;
const RECORD_HEADER_SIZE: usize = 4;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining in record")]
    NotEnoughData(usize),

    #[error("String ended {0} characters early")]
    TruncatedString(usize),
}

pub(crate) struct Biff8Reader {
    /// Code page for 8-bit strings, set from the CODEPAGE record.
    pub(crate) encoding: &'static Encoding,
    stream: Vec<u8>,
    next_record: usize,
    segments: Vec<Range<usize>>,
    segment: usize,
    offset: usize,
}

impl Biff8Reader {
    pub(crate) fn new(stream: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: UTF_16LE,
            stream,
            next_record: 0,
            segments: Vec::new(),
            segment: 0,
            offset: 0,
        }
    }

    /// Advances to the next record and returns its type, or `None` at end of stream.
    pub(crate) fn next(&mut self) -> Result<Option<u16>, ChromaSheetError> {
        if self.next_record + RECORD_HEADER_SIZE > self.stream.len() {
            return Ok(None);
        }
        let Some(kind) = self.word_at(self.next_record) else {
            return Ok(None);
        };
        self.segments.clear();
        self.segment = 0;
        self.offset = 0;
        self.push_segment()?;
        while self.word_at(self.next_record) == Some(CONTINUE) {
            self.push_segment()?;
        }
        Ok(Some(kind))
    }

    fn push_segment(&mut self) -> Result<(), ChromaSheetError> {
        let size = self
            .word_at(self.next_record + 2)
            .ok_or(Biff8Error::NotEnoughData(RECORD_HEADER_SIZE))? as usize;
        let lower = self.next_record + RECORD_HEADER_SIZE;
        let upper = (lower + size).min(self.stream.len());
        self.segments.push(lower..upper);
        self.next_record = lower + size;
        Ok(())
    }

    /// Jumps to an absolute stream offset, e.g. the BOF of a worksheet substream.
    pub(crate) fn goto(&mut self, position: usize) {
        self.next_record = position;
    }

    fn word_at(&self, index: usize) -> Option<u16> {
        self.stream.get(index..index + 2).map(le_u16)
    }

    /// Reads at most `length` bytes without crossing into the next segment.
    fn read_partial(&mut self, length: usize) -> &[u8] {
        let Some(range) = self.segments.get(self.segment) else {
            return &[];
        };
        let lower = range.start + self.offset;
        let upper = range.end.min(lower + length);
        if lower >= range.end {
            return &[];
        }
        if upper == range.end {
            self.segment += 1;
            self.offset = 0;
        } else {
            self.offset += upper - lower;
        }
        &self.stream[lower..upper]
    }

    fn take(&mut self, length: usize) -> Result<&[u8], ChromaSheetError> {
        let bytes = self.read_partial(length);
        if bytes.len() == length {
            Ok(bytes)
        } else {
            Err(Biff8Error::NotEnoughData(length))?
        }
    }

    /// Skips bytes, crossing segment boundaries when needed.
    pub(crate) fn skip(&mut self, length: usize) -> Result<(), ChromaSheetError> {
        let mut remaining = length;
        while remaining > 0 {
            let read = self.read_partial(remaining).len();
            if read == 0 {
                Err(Biff8Error::NotEnoughData(remaining))?;
            }
            remaining -= read;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ChromaSheetError> {
        self.take(1).map(|bytes| bytes[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ChromaSheetError> {
        self.take(2).map(le_u16)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ChromaSheetError> {
        self.take(4).map(le_u32)
    }

    pub(crate) fn read_index(&mut self) -> Result<usize, ChromaSheetError> {
        self.take(4).map(le_index)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, ChromaSheetError> {
        self.take(8).map(le_f64)
    }

    /// The last u16 of the current record; MULRK keeps its final column there.
    pub(crate) fn trailing_u16(&self) -> Result<u16, ChromaSheetError> {
        self.segments
            .last()
            .filter(|range| range.len() >= 2)
            .and_then(|range| self.word_at(range.end - 2))
            .ok_or_else(|| Biff8Error::NotEnoughData(2).into())
    }

    /// RK values pack either a 30-bit integer or the high 30 bits of an f64,
    /// optionally scaled by 100.
    pub(crate) fn read_rk_number(&mut self) -> Result<f64, ChromaSheetError> {
        let raw = self.read_u32()?;
        let mut value = if raw & 0x02 != 0 {
            ((raw as i32) >> 2) as f64
        } else {
            f64::from_bits(((raw & 0xFFFF_FFFC) as u64) << 32)
        };
        if raw & 0x01 != 0 {
            value /= 100.0;
        }
        Ok(value)
    }

    /// ShortXLUnicodeString: 1-byte character count.
    pub(crate) fn read_short_string(&mut self) -> Result<String, ChromaSheetError> {
        let chars = self.read_u8()? as usize;
        self.read_string_body(chars, false)
    }

    /// XLUnicodeString: 2-byte character count.
    pub(crate) fn read_string(&mut self) -> Result<String, ChromaSheetError> {
        let chars = self.read_u16()? as usize;
        self.read_string_body(chars, false)
    }

    /// XLUnicodeRichExtendedString as stored in the SST; formatting runs and
    /// phonetic blocks are skipped.
    pub(crate) fn read_rich_string(&mut self) -> Result<String, ChromaSheetError> {
        let chars = self.read_u16()? as usize;
        self.read_string_body(chars, true)
    }

    fn read_string_body(&mut self, chars: usize, extended: bool) -> Result<String, ChromaSheetError> {
        let flags = self.read_u8()?;
        let runs = if extended && flags & 0x08 != 0 { self.read_u16()? as usize } else { 0 };
        let phonetic = if extended && flags & 0x04 != 0 { self.read_index()? } else { 0 };

        let mut text = String::with_capacity(chars);
        let mut wide = flags & 0x01 != 0;
        let mut remaining = chars;
        loop {
            remaining -= self.read_chars(remaining, wide, &mut text);
            if remaining == 0 {
                break;
            }
            // a string split by CONTINUE restates its width flag
            match self.read_u8() {
                Ok(flag) => wide = flag & 0x01 != 0,
                Err(_) => Err(Biff8Error::TruncatedString(remaining))?,
            }
        }

        self.skip(4 * runs)?;
        self.skip(phonetic)?;
        Ok(text)
    }

    fn read_chars(&mut self, chars: usize, wide: bool, text: &mut String) -> usize {
        let encoding = self.encoding;
        let bytes = self.read_partial(if wide { chars * 2 } else { chars });
        if wide {
            text.push_str(&UTF_16LE.decode_without_bom_handling(bytes).0);
            bytes.len() / 2
        } else {
            if encoding == UTF_16LE {
                text.extend(bytes.iter().map(|byte| *byte as char));
            } else {
                text.push_str(&encoding.decode_without_bom_handling(bytes).0);
            }
            bytes.len()
        }
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
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

    #[test]
    fn iterates_records_and_reads_fields() {
        let mut stream = record(0x0203, &[1, 0, 2, 0]);
        stream.extend(record(0x000A, &[]));
        let mut reader = Biff8Reader::new(stream);

        assert_eq!(reader.next().unwrap(), Some(0x0203));
        assert_eq!(reader.read_u16().unwrap(), 1);
        assert_eq!(reader.read_u16().unwrap(), 2);
        assert!(reader.read_u8().is_err());
        assert_eq!(reader.next().unwrap(), Some(0x000A));
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn decodes_rk_numbers() {
        // integer 3, stored as 3 << 2 | 0b10
        let mut reader = Biff8Reader::new(record(0x027E, &14u32.to_le_bytes()));
        reader.next().unwrap();
        assert_eq!(reader.read_rk_number().unwrap(), 3.0);

        // integer 150 scaled by 1/100
        let mut reader = Biff8Reader::new(record(0x027E, &((150u32 << 2) | 0b11).to_le_bytes()));
        reader.next().unwrap();
        assert_eq!(reader.read_rk_number().unwrap(), 1.5);
    }

    #[test]
    fn joins_strings_split_by_continue() {
        // "Hello" as a compressed string whose last two chars land in a CONTINUE record
        let mut stream = record(0x00FC, &[5, 0, 0, b'H', b'e', b'l']);
        stream.extend(record(CONTINUE, &[1, b'l', 0, b'o', 0]));
        let mut reader = Biff8Reader::new(stream);

        reader.next().unwrap();
        assert_eq!(reader.read_rich_string().unwrap(), "Hello");
    }

    #[test]
    fn trailing_word_comes_from_record_end() {
        let mut reader = Biff8Reader::new(record(0x00BD, &[0, 0, 1, 0, 9, 0]));
        reader.next().unwrap();
        assert_eq!(reader.trailing_u16().unwrap(), 9);
    }
}

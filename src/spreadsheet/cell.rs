use crate::spreadsheet::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use std::fmt::Display;

/// Types of cell data decoded from a workbook.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CellType {
    #[default]
    Empty,
    /// Stored as "1" / "0"
    Boolean,
    Number,
    /// Serial numbers counted from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial numbers counted from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 text from `t="d"` cells
    IsoDateTime,
    Text,
    /// Formula error literal such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Built-in Excel number format ids that render as dates or times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::date_kind(true, true, is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date_kind(true, false, is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::date_kind(false, true, is_1904)),
            _ => None,
        }
    }

    /// Classifies a custom format code by scanning for date and time tokens
    /// outside of quoted literals, escapes, and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut escaped = false;
        let mut quoted = false;
        let mut bracketed = false;
        let mut has_date = false;
        let mut has_time = false;
        for character in format.chars() {
            match character {
                _ if escaped => escaped = false,
                '_' | '\\' => escaped = true,
                '"' if !bracketed => quoted = !quoted,
                '[' if !quoted => bracketed = true,
                ']' if bracketed => bracketed = false,
                _ if quoted || bracketed => (),
                'Y' | 'y' | 'D' | 'd' => has_date = true,
                'H' | 'h' | 'S' | 's' => has_time = true,
                _ => (),
            }
        }
        if has_date || has_time {
            Self::date_kind(has_date, has_time, is_1904)
        } else {
            Self::Number
        }
    }

    fn date_kind(date: bool, time: bool, is_1904: bool) -> Self {
        match (date, time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, false, false) => Self::NumberDate1900,
            (false, _, false) => Self::NumberTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, true) => Self::NumberDate1904,
            (false, _, true) => Self::NumberTime1904,
        }
    }

    /// True for every kind whose stored value is a serial number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::NumberDateTime1900
                | Self::NumberDate1900
                | Self::NumberTime1900
                | Self::NumberDateTime1904
                | Self::NumberDate1904
                | Self::NumberTime1904
        )
    }
}

/// Converts BIFF error codes to their display literals.
pub(crate) fn to_error_value(value: u8) -> &'static str {
    match value {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// One decoded cell at a 0-based position.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub kind: CellType,
    /// Raw stored value; numbers keep their serial form
    pub value: String,
}

impl Cell {
    pub fn new(row: usize, col: usize, kind: CellType, value: impl Into<String>) -> Self {
        Cell { row, col, kind, value: value.into() }
    }

    /// A1-style reference, e.g. `E1`.
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Numeric reading of the cell. Text is accepted when it parses as a
    /// float after trimming; booleans read as 1 and 0.
    pub fn to_number(&self) -> Option<f64> {
        match self.kind {
            CellType::Boolean => Some(if self.value == "1" { 1.0 } else { 0.0 }),
            CellType::Text => self.value.trim().parse().ok(),
            kind if kind.is_numeric() => self.value.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = match self.kind {
            CellType::Empty => None,
            CellType::Boolean => Some(if self.value == "1" { "TRUE" } else { "FALSE" }.to_owned()),
            CellType::Number => self.value.trim().parse::<f64>().ok().map(|number| number.to_string()),
            CellType::NumberDateTime1900 => serial_to_string(&self.value, false, "%Y-%m-%d %H:%M:%S"),
            CellType::NumberDate1900 => serial_to_string(&self.value, false, "%Y-%m-%d"),
            CellType::NumberDateTime1904 => serial_to_string(&self.value, true, "%Y-%m-%d %H:%M:%S"),
            CellType::NumberDate1904 => serial_to_string(&self.value, true, "%Y-%m-%d"),
            CellType::NumberTime1900 | CellType::NumberTime1904 => serial_to_string(&self.value, false, "%H:%M:%S"),
            CellType::IsoDateTime => Some(self.value.replace('T', " ")),
            CellType::Text | CellType::Error => None,
        };
        match rendered {
            Some(text) => f.write_str(&text),
            None if self.kind == CellType::Empty => Ok(()),
            None => f.write_str(&self.value),
        }
    }
}

/// Interprets an Excel serial day number. Serials below 60 in the 1900
/// system sit before the phantom 1900-02-29 and shift by one day.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    let days = serial.trunc() as i64;
    let (epoch, days) = if is_1904 {
        (NaiveDate::from_ymd_opt(1904, 1, 1)?, days)
    } else {
        (NaiveDate::from_ymd_opt(1899, 12, 30)?, if days < 60 { days + 1 } else { days })
    };
    let millis = (serial.fract() * 86_400_000.0).round() as i64;
    epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn serial_to_string(value: &str, is_1904: bool, format: &str) -> Option<String> {
    let serial = value.trim().parse::<f64>().ok()?;
    serial_to_datetime(serial, is_1904).map(|datetime| datetime.format(format).to_string())
}

//! Non-fatal findings collected while reading one workbook.
//!
//! Each finding is logged through the `log` facade and also kept, tagged with
//! the study category being read, so callers can inspect them without
//! installing a logger.

use log::Level;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// Study category being read, e.g. `load_data`; empty outside of one.
    pub category: String,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    category: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Tags the following findings with `category`.
    pub fn enter(&mut self, category: &str) {
        self.category = category.to_owned();
    }

    pub fn info(&mut self, message: String) {
        log::info!("{message}");
        self.push(Level::Info, message);
    }

    pub fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.push(Level::Warn, message);
    }

    fn push(&mut self, level: Level, message: String) {
        self.entries.push(Diagnostic { level, category: self.category.to_owned(), message });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Hands over the findings, leaving the collection empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

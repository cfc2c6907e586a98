//! Structured output of a study workbook.

use crate::diagnostics::Diagnostic;
use crate::error::ChromaSheetError;
use crate::spreadsheet::Cell;
use serde::Serialize;
use std::collections::BTreeMap;

/// A field value read from the grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Integer(i64),
}

impl Value {
    /// Numeric cells become numbers; anything else keeps its displayed text.
    pub fn from_cell(cell: Option<&Cell>) -> Self {
        match cell {
            Some(cell) if cell.kind.is_numeric() => match cell.to_number() {
                Some(number) => Value::Number(number),
                None => Value::Text(cell.to_string()),
            },
            Some(cell) => Value::Text(cell.to_string()),
            None => Value::Text(String::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Integer(integer) => Some(*integer as f64),
            Value::Text(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(integer) => Some(*integer),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(integer: i64) -> Self {
        Value::Integer(integer)
    }
}

/// Field name to value, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_number)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_integer)
    }

    pub fn extend(&mut self, other: Record) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

/// Assay name to measured fraction.
pub type AssayDict = BTreeMap<String, f64>;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LoadRecord {
    #[serde(flatten)]
    pub fields: Record,
    pub product_component_assay_dict: AssayDict,
    pub impurity_assay_dict: AssayDict,
    pub chemical_component_concentration_dict: BTreeMap<String, f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ChemicalState {
    Solid,
    Liquid,
}

/// One chemical added to a buffer. Solids carry a concentration of 0.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BufferChemical {
    pub state: ChemicalState,
    pub concentration: f64,
    pub amount: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BufferRecord {
    #[serde(flatten)]
    pub fields: Record,
    pub chemical_dict: BTreeMap<String, BufferChemical>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub step_type: Option<String>,
    pub volume: Option<f64>,
    pub flow_rate: Option<f64>,
    pub solution_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodRecord {
    #[serde(flatten)]
    pub fields: Record,
    pub steps: Vec<StepRecord>,
    pub collection_criteria: Record,
    /// 0-based index into `steps`, or -1 when nothing is collected
    pub collection_step_number: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    #[serde(flatten)]
    pub fields: Record,
    pub product_component_assay_dict: AssayDict,
    pub impurity_assay_dict: AssayDict,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FractionRecord {
    pub time: Value,
    pub total_concentration: Value,
    pub product_component_assay_dict: AssayDict,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExperimentRecord {
    pub method_data: MethodRecord,
    pub performance_parameter_data: Option<PerformanceRecord>,
    pub fraction_data: Option<Vec<FractionRecord>>,
    pub continuous_data: Option<String>,
}

/// Everything extracted from one workbook.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StudyData {
    pub general_data: Record,
    pub system_data: Record,
    pub column_data: Record,
    pub load_data: BTreeMap<String, LoadRecord>,
    pub buffer_prep_data: BTreeMap<String, BufferRecord>,
    pub experiment_data: BTreeMap<String, ExperimentRecord>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl StudyData {
    pub fn to_json_pretty(&self) -> Result<String, ChromaSheetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

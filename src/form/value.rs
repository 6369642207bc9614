//! Typed values of form fields.

use crate::odf::CellValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One field value, as submitted or as read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FormValue {
    /// No value
    Empty,
    /// Free text, or a cell that did not parse as the field's kind
    Text(String),
    /// Numeric value
    Number(f64),
    /// Checkbox state
    Bool(bool),
    /// Calendar date
    Date(NaiveDate),
}

/// Field values keyed by field label.
pub type Values = BTreeMap<String, FormValue>;

impl FormValue {
    /// Whether the value is written to the spreadsheet: empty text, `false`
    /// and `Empty` clear the target cell instead.
    pub fn is_set(&self) -> bool {
        match self {
            FormValue::Empty => false,
            FormValue::Text(s) => !s.is_empty(),
            FormValue::Bool(b) => *b,
            FormValue::Number(_) | FormValue::Date(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FormValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Empty => Ok(()),
            FormValue::Text(s) => f.write_str(s),
            FormValue::Number(n) => f.write_str(&CellValue::Number(*n).display_text()),
            FormValue::Bool(b) => write!(f, "{}", b),
            FormValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Number(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Bool(value)
    }
}

impl From<NaiveDate> for FormValue {
    fn from(value: NaiveDate) -> Self {
        FormValue::Date(value)
    }
}

//! Turning raw user input into typed field values.
//!
//! [`FormDocument::commit`](super::FormDocument::commit) stores whatever it
//! is given; front ends run [`validate`] first so that users get one report
//! listing every field they got wrong.

use super::field::{parse_date, parse_number};
use super::{Field, FieldKind, FormValue, Values};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// What is wrong with the input of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required field was left empty or unchecked
    Required,
    /// Not an integer or decimal number
    InvalidNumber,
    /// Not a checkbox state
    InvalidBoolean,
    /// Not one of the choices of a `list` field
    InvalidChoice,
    /// Not a `YYYY-MM-DD` date
    InvalidDate,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldErrorKind::Required => "is required",
            FieldErrorKind::InvalidNumber => "must be a number",
            FieldErrorKind::InvalidBoolean => "must be yes or no",
            FieldErrorKind::InvalidChoice => "must be one of the listed choices",
            FieldErrorKind::InvalidDate => "must be a date (YYYY-MM-DD)",
        })
    }
}

/// A rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label} {kind}")]
pub struct FieldError {
    pub label: String,
    pub kind: FieldErrorKind,
}

/// Every field rejected by [`validate`], in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// The error of the field with this label, if it was rejected.
    pub fn get(&self, label: &str) -> Option<&FieldErrorKind> {
        self.errors
            .iter()
            .find(|error| error.label == label)
            .map(|error| &error.kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check raw input strings, keyed by label, against `fields`.
///
/// Returns one value per field. Surrounding whitespace is ignored except in
/// `longtext` fields, which are kept as typed. An empty checkbox gets the
/// field's initial value, `static` fields always get their params and
/// labels that are not fields are ignored.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use seafform::form::{Field, FieldErrorKind, FormValue, Vocabulary, validate};
///
/// let vocabulary = Vocabulary::new();
/// let fields = vec![
///     Field::from_column(&vocabulary, 1, "Name", "text*", "", "").unwrap(),
///     Field::from_column(&vocabulary, 2, "Guests", "number", "", "").unwrap(),
/// ];
///
/// let mut raw = BTreeMap::new();
/// raw.insert("Guests".to_string(), "two".to_string());
/// let errors = validate(&fields, &raw).unwrap_err();
/// assert_eq!(errors.get("Name"), Some(&FieldErrorKind::Required));
/// assert_eq!(errors.get("Guests"), Some(&FieldErrorKind::InvalidNumber));
///
/// raw.insert("Name".to_string(), "Alice".to_string());
/// raw.insert("Guests".to_string(), "2".to_string());
/// let values = validate(&fields, &raw).unwrap();
/// assert_eq!(values["Guests"], FormValue::Number(2.0));
/// ```
pub fn validate(fields: &[Field], raw: &BTreeMap<String, String>) -> Result<Values, ValidationErrors> {
    let mut values = Values::new();
    let mut errors = Vec::new();

    for field in fields {
        let input = raw.get(&field.label).map_or("", String::as_str);
        match validate_field(field, input) {
            Ok(value) => {
                values.insert(field.label.clone(), value);
            },
            Err(kind) => errors.push(FieldError {
                label: field.label.clone(),
                kind,
            }),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(ValidationErrors { errors })
    }
}

fn validate_field(field: &Field, input: &str) -> Result<FormValue, FieldErrorKind> {
    if field.kind == FieldKind::Static {
        return Ok(field
            .params
            .as_ref()
            .map_or(FormValue::Empty, |params| FormValue::Text(params.clone())));
    }

    let trimmed = input.trim();
    if field.kind.is_boolean() {
        let checked = if trimmed.is_empty() {
            field.initial_value().as_bool().unwrap_or(false)
        } else {
            parse_checkbox(trimmed).ok_or(FieldErrorKind::InvalidBoolean)?
        };
        if field.required && !checked {
            return Err(FieldErrorKind::Required);
        }
        return Ok(FormValue::Bool(checked));
    }

    if trimmed.is_empty() {
        return if field.required {
            Err(FieldErrorKind::Required)
        } else {
            Ok(FormValue::Empty)
        };
    }

    match field.kind {
        FieldKind::Number => parse_number(trimmed)
            .map(FormValue::Number)
            .ok_or(FieldErrorKind::InvalidNumber),
        FieldKind::Date => parse_date_only(trimmed)
            .map(FormValue::Date)
            .ok_or(FieldErrorKind::InvalidDate),
        FieldKind::List => field
            .choices
            .iter()
            .find(|choice| choice.as_str() == trimmed)
            .map(|choice| FormValue::Text(choice.clone()))
            .ok_or(FieldErrorKind::InvalidChoice),
        FieldKind::LongText => Ok(FormValue::Text(input.to_string())),
        _ => Ok(FormValue::Text(trimmed.to_string())),
    }
}

fn parse_checkbox(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

/// Dates typed by users carry no time part.
fn parse_date_only(s: &str) -> Option<chrono::NaiveDate> {
    if s.contains('T') {
        return None;
    }
    parse_date(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Vocabulary;
    use chrono::NaiveDate;

    fn field(label: &str, kind: &str, params: &str) -> Field {
        Field::from_column(&Vocabulary::new(), 1, label, kind, params, "").unwrap()
    }

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_collects_every_error() {
        let fields = vec![
            field("Name", "text*", ""),
            field("Age", "number", ""),
            field("Color", "list", "red, blue"),
            field("Day", "date", ""),
            field("Agree", "check", ""),
        ];
        let input = raw(&[
            ("Age", "old"),
            ("Color", "green"),
            ("Day", "2015-13-01"),
            ("Agree", "perhaps"),
        ]);

        let errors = validate(&fields, &input).unwrap_err();
        let kinds: Vec<_> = errors.errors.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                FieldErrorKind::Required,
                FieldErrorKind::InvalidNumber,
                FieldErrorKind::InvalidChoice,
                FieldErrorKind::InvalidDate,
                FieldErrorKind::InvalidBoolean,
            ]
        );
        assert!(errors.to_string().starts_with("Name is required; Age must be a number"));
    }

    #[test]
    fn test_typed_values() {
        let fields = vec![
            field("Name", "text", ""),
            field("Notes", "longtext", ""),
            field("Age", "number", ""),
            field("Color", "list", "red, blue"),
            field("Day", "date", ""),
            field("Agree", "check", ""),
            field("Newsletter", "checked", ""),
            field("Event", "static", "Party 2015"),
        ];
        let input = raw(&[
            ("Name", "  Alice "),
            ("Notes", "line one\nline two\n"),
            ("Age", "42"),
            ("Color", " blue"),
            ("Day", "2015-09-20"),
            ("Agree", "Yes"),
            ("Event", "ignored"),
            ("Unknown", "dropped"),
        ]);

        let values = validate(&fields, &input).unwrap();
        assert_eq!(values["Name"], FormValue::from("Alice"));
        assert_eq!(values["Notes"], FormValue::from("line one\nline two\n"));
        assert_eq!(values["Age"], FormValue::Number(42.0));
        assert_eq!(values["Color"], FormValue::from("blue"));
        assert_eq!(
            values["Day"],
            FormValue::Date(NaiveDate::from_ymd_opt(2015, 9, 20).unwrap())
        );
        assert_eq!(values["Agree"], FormValue::Bool(true));
        assert_eq!(values["Newsletter"], FormValue::Bool(true));
        assert_eq!(values["Event"], FormValue::from("Party 2015"));
        assert!(!values.contains_key("Unknown"));
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let fields = vec![field("Age", "number", ""), field("Agree", "check", "")];
        let values = validate(&fields, &raw(&[("Age", "   ")])).unwrap();
        assert_eq!(values["Age"], FormValue::Empty);
        assert_eq!(values["Agree"], FormValue::Bool(false));
    }

    #[test]
    fn test_required_checkbox_must_be_checked() {
        let fields = vec![field("Terms", "check*", "")];
        let errors = validate(&fields, &raw(&[("Terms", "off")])).unwrap_err();
        assert_eq!(errors.get("Terms"), Some(&FieldErrorKind::Required));
        assert!(validate(&fields, &raw(&[("Terms", "on")])).is_ok());
    }
}

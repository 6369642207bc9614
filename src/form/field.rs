//! Field schema: what one spreadsheet column declares.

use super::{FormValue, Vocabulary};
use crate::common::xml::xml_text;
use crate::odf::CellValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of a form field, declared by the second header cell of its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Single-line text (`text`)
    #[serde(rename = "text")]
    Text,
    /// Multi-line text (`longtext`)
    #[serde(rename = "longtext")]
    LongText,
    /// One of the comma-separated choices in the params cell (`list`)
    #[serde(rename = "list")]
    List,
    /// Checkbox, unchecked by default (`check`)
    #[serde(rename = "check")]
    Boolean,
    /// Checkbox, checked by default (`checked`)
    #[serde(rename = "checked")]
    BooleanDefaultTrue,
    /// Calendar date (`date`)
    #[serde(rename = "date")]
    Date,
    /// Number (`number`)
    #[serde(rename = "number")]
    Number,
    /// Fixed value taken from the params cell, not editable (`static`)
    #[serde(rename = "static")]
    Static,
}

impl FieldKind {
    /// Canonical token of the kind.
    pub fn token(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::LongText => "longtext",
            FieldKind::List => "list",
            FieldKind::Boolean => "check",
            FieldKind::BooleanDefaultTrue => "checked",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Static => "static",
        }
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, FieldKind::Boolean | FieldKind::BooleanDefaultTrue)
    }

    /// Interpret a spreadsheet cell as a value of this kind.
    ///
    /// Cells that do not fit the kind are kept as raw text, never rejected.
    pub fn decode(self, cell: &CellValue) -> FormValue {
        if is_empty_cell(cell) {
            return if self.is_boolean() {
                FormValue::Bool(false)
            } else {
                FormValue::Empty
            };
        }

        match self {
            FieldKind::Boolean | FieldKind::BooleanDefaultTrue => match cell {
                CellValue::Text(s) => match parse_bool(s) {
                    Some(b) => FormValue::Bool(b),
                    None => FormValue::Text(s.clone()),
                },
                other => decode_any(other, |n| FormValue::Bool(n != 0.0)),
            },
            FieldKind::Number => match cell {
                CellValue::Text(s) => match parse_number(s) {
                    Some(n) => FormValue::Number(n),
                    None => FormValue::Text(s.clone()),
                },
                other => decode_any(other, FormValue::Number),
            },
            FieldKind::Date => match cell {
                CellValue::Text(s) | CellValue::Date(s) => match parse_date(s) {
                    Some(d) => FormValue::Date(d),
                    None => FormValue::Text(s.clone()),
                },
                other => decode_any(other, FormValue::Number),
            },
            FieldKind::Text | FieldKind::LongText | FieldKind::List | FieldKind::Static => {
                decode_any(cell, FormValue::Number)
            },
        }
    }
}

fn is_empty_cell(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(s) => s.is_empty(),
        _ => false,
    }
}

/// Kind-independent decoding; `number` decides what numeric cells become.
fn decode_any(cell: &CellValue, number: impl FnOnce(f64) -> FormValue) -> FormValue {
    match cell {
        CellValue::Empty => FormValue::Empty,
        CellValue::Text(s) | CellValue::Date(s) | CellValue::Time(s) => FormValue::Text(s.clone()),
        CellValue::Boolean(b) => FormValue::Bool(*b),
        CellValue::Number(n) | CellValue::Currency(n, _) | CellValue::Percentage(n) => number(*n),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s == "1" || s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s == "0" || s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Integer or decimal notation only; `inf` and `NaN` are not numbers here.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `YYYY-MM-DD`, optionally followed by a time as in ODS date values.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date = s.split_once('T').map_or(s, |(date, _)| date);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Encode a value for the grid; `None` means the cell is cleared.
///
/// Text loses the characters a spreadsheet file cannot hold and gets `\n`
/// line breaks.
pub fn encode(value: &FormValue) -> Option<CellValue> {
    if !value.is_set() {
        return None;
    }
    Some(match value {
        FormValue::Bool(_) => CellValue::Number(1.0),
        FormValue::Number(n) => CellValue::Number(*n),
        FormValue::Date(d) => CellValue::Date(d.format("%Y-%m-%d").to_string()),
        FormValue::Text(s) => match xml_text(s) {
            text if text.is_empty() => return None,
            text => CellValue::Text(text.into_owned()),
        },
        FormValue::Empty => return None,
    })
}

/// Split a `list` params cell into its choices, dropping empty pieces.
pub fn parse_choices(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(str::to_string)
        .collect()
}

/// One declared input column of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within the form
    pub label: String,
    pub kind: FieldKind,
    pub description: Option<String>,
    /// Raw params cell
    pub params: Option<String>,
    /// Parsed params of a `list` field
    pub choices: Vec<String>,
    pub required: bool,
    /// 0-based spreadsheet column
    pub column: usize,
}

impl Field {
    /// Build a field from the four header cells of a column.
    ///
    /// Returns `None` when the kind cell holds no known kind token; such
    /// columns are annotations, not fields. A trailing `*` on the kind token
    /// makes the field required, except for `static` fields.
    pub fn from_column(
        vocabulary: &Vocabulary,
        column: usize,
        name: &str,
        kind_token: &str,
        params: &str,
        description: &str,
    ) -> Option<Field> {
        let kind_token = kind_token.trim();
        if kind_token.is_empty() {
            return None;
        }
        let starred = kind_token.ends_with('*');
        let kind = vocabulary.kind(kind_token.trim_end_matches('*'))?;

        let choices = match kind {
            FieldKind::List => parse_choices(params),
            _ => Vec::new(),
        };
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        Some(Field {
            label: name.trim().to_string(),
            kind,
            description: non_empty(description),
            params: non_empty(params),
            choices,
            required: starred && kind != FieldKind::Static,
            column,
        })
    }

    /// Value the field starts with on an empty form.
    pub fn initial_value(&self) -> FormValue {
        match self.kind {
            FieldKind::Boolean => FormValue::Bool(false),
            FieldKind::BooleanDefaultTrue => FormValue::Bool(true),
            _ => FormValue::Empty,
        }
    }

    /// Whether visitors may enter a value.
    pub fn is_editable(&self) -> bool {
        self.kind != FieldKind::Static
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind_token: &str, params: &str) -> Option<Field> {
        Field::from_column(&Vocabulary::new(), 1, "Name", kind_token, params, "")
    }

    #[test]
    fn test_from_column() {
        let f = field("text*", "").unwrap();
        assert_eq!(f.kind, FieldKind::Text);
        assert!(f.required);
        assert_eq!(f.params, None);
        assert_eq!(f.description, None);

        let f = field(" list ", "red, green ,blue").unwrap();
        assert_eq!(f.choices, vec!["red", "green", "blue"]);
        assert!(!f.required);

        assert!(field("", "").is_none());
        assert!(field("comment", "").is_none());
        assert!(!field("static*", "fixed").unwrap().required);
    }

    #[test]
    fn test_initial_values() {
        assert_eq!(field("check", "").unwrap().initial_value(), FormValue::Bool(false));
        assert_eq!(field("checked", "").unwrap().initial_value(), FormValue::Bool(true));
        assert_eq!(field("date", "").unwrap().initial_value(), FormValue::Empty);
    }

    #[test]
    fn test_decode_booleans() {
        let kind = FieldKind::Boolean;
        assert_eq!(kind.decode(&CellValue::Empty), FormValue::Bool(false));
        assert_eq!(kind.decode(&CellValue::Number(1.0)), FormValue::Bool(true));
        assert_eq!(kind.decode(&CellValue::Number(0.0)), FormValue::Bool(false));
        assert_eq!(kind.decode(&CellValue::Text("TRUE".into())), FormValue::Bool(true));
        assert_eq!(kind.decode(&CellValue::Text("maybe".into())), FormValue::Text("maybe".into()));
    }

    #[test]
    fn test_decode_dates() {
        let kind = FieldKind::Date;
        let date = NaiveDate::from_ymd_opt(2015, 9, 20).unwrap();
        assert_eq!(kind.decode(&CellValue::Date("2015-09-20".into())), FormValue::Date(date));
        assert_eq!(
            kind.decode(&CellValue::Date("2015-09-20T00:00:00".into())),
            FormValue::Date(date)
        );
        assert_eq!(kind.decode(&CellValue::Text("2015-09-20".into())), FormValue::Date(date));
        assert_eq!(
            kind.decode(&CellValue::Text("next tuesday".into())),
            FormValue::Text("next tuesday".into())
        );
    }

    #[test]
    fn test_decode_numbers_and_text() {
        assert_eq!(FieldKind::Number.decode(&CellValue::Text(" 12.5 ".into())), FormValue::Number(12.5));
        assert_eq!(FieldKind::Number.decode(&CellValue::Text("inf".into())), FormValue::Text("inf".into()));
        assert_eq!(FieldKind::Text.decode(&CellValue::Number(3.0)), FormValue::Number(3.0));
        assert_eq!(FieldKind::Text.decode(&CellValue::Date("2015-01-01".into())), FormValue::Text("2015-01-01".into()));
        assert_eq!(FieldKind::List.decode(&CellValue::Empty), FormValue::Empty);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(&FormValue::Bool(true)), Some(CellValue::Number(1.0)));
        assert_eq!(encode(&FormValue::Bool(false)), None);
        assert_eq!(encode(&FormValue::Text(String::new())), None);
        assert_eq!(encode(&FormValue::Number(0.0)), Some(CellValue::Number(0.0)));
        assert_eq!(
            encode(&FormValue::from("a\u{1}b\r\nc")),
            Some(CellValue::Text("ab\nc".into()))
        );
        assert_eq!(encode(&FormValue::from("\u{7}\u{8}")), None);
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(encode(&FormValue::Date(date)), Some(CellValue::Date("2020-02-29".into())));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn choice_strategy() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9][a-zA-Z0-9 ]{0,10}".prop_map(|s| s.trim().to_string())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn prop_choices_survive_joining(choices in prop::collection::vec(choice_strategy(), 1..8)) {
                let params = choices.join(" , ");
                prop_assert_eq!(parse_choices(&params), choices);
            }

            #[test]
            fn prop_choices_are_trimmed_and_non_empty(params in "[a-z ,]{0,40}") {
                for choice in parse_choices(&params) {
                    prop_assert!(!choice.is_empty());
                    prop_assert_eq!(choice.trim(), choice.as_str());
                    prop_assert!(!choice.contains(','));
                }
            }

            #[test]
            fn prop_numbers_read_back(n in -1.0e12f64..1.0e12f64) {
                let cell = encode(&FormValue::Number(n)).unwrap();
                prop_assert_eq!(FieldKind::Number.decode(&cell), FormValue::Number(n));
            }

            #[test]
            fn prop_dates_read_back(days in 0i64..100_000) {
                let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Duration::days(days);
                let cell = encode(&FormValue::Date(date)).unwrap();
                prop_assert_eq!(FieldKind::Date.decode(&cell), FormValue::Date(date));
            }

            #[test]
            fn prop_text_reads_back(text in "[^\\x00-\\x1f\\x{fffe}\\x{ffff}]{1,30}") {
                let value = FormValue::Text(text);
                let cell = encode(&value).unwrap();
                prop_assert_eq!(FieldKind::LongText.decode(&cell), value);
            }

            #[test]
            fn prop_encoded_text_is_valid_xml(text in "[\\x00-\\x1f a-z\\x{fffe}]{0,30}") {
                if let Some(CellValue::Text(stored)) = encode(&FormValue::Text(text)) {
                    prop_assert!(!stored.is_empty());
                    prop_assert!(!stored.contains('\r'));
                    prop_assert!(!stored.contains('\u{fffe}'), "stored text contains U+FFFE");
                    prop_assert!(stored.chars().all(|ch| ch >= ' ' || ch == '\t' || ch == '\n'));
                }
            }

            #[test]
            fn prop_checkboxes_read_back(checked in any::<bool>()) {
                let cell = encode(&FormValue::Bool(checked)).unwrap_or(CellValue::Empty);
                prop_assert_eq!(FieldKind::Boolean.decode(&cell), FormValue::Bool(checked));
            }
        }
    }
}
